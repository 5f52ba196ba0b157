use std::fmt;
use std::str::FromStr;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Calendar month of a monthly dump ("YYYY-MM"), ordered chronologically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: u16,
    pub month: u8, // 1..=12
}

impl YearMonth {
    pub fn new(year: u16, month: u8) -> Self {
        assert!((1..=12).contains(&month), "Month must be 1..=12");
        Self { year, month }
    }

    /// Inclusive range check; an open bound accepts everything on that side.
    pub fn within(self, start: Option<YearMonth>, end: Option<YearMonth>) -> bool {
        start.map_or(true, |s| self >= s) && end.map_or(true, |e| self <= e)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, m) = s.trim().split_once('-').ok_or("expected YYYY-MM")?;
        let year: u16 = y.parse().map_err(|_| "invalid year")?;
        let month: u8 = m.parse().map_err(|_| "invalid month")?;
        if !(1..=12).contains(&month) {
            return Err("month must be 01..12".into());
        }
        Ok(Self { year, month })
    }
}

/// Convert Reddit's `created_utc` (epoch seconds, fractional in API payloads)
/// into a zone-less UTC timestamp suitable for a `TIMESTAMP` column.
/// Sub-second precision is dropped.
pub fn utc_from_epoch(secs: f64) -> Option<PrimitiveDateTime> {
    if !secs.is_finite() {
        return None;
    }
    let dt = OffsetDateTime::from_unix_timestamp(secs.trunc() as i64).ok()?;
    Some(PrimitiveDateTime::new(dt.date(), dt.time()))
}
