//! Record-level predicate deciding which dump lines are worth a live fetch.

use crate::config::{ScrapeOptions, DEFAULT_MIN_SCORE, TEA_SUBREDDIT_ID};
use crate::dump::DumpRecord;

/// Keep a record when its community matches exactly and its score is strictly
/// above `min_score`. Records missing either field are rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionFilter {
    pub subreddit_id: String,
    pub min_score: i64,
}

impl Default for SubmissionFilter {
    fn default() -> Self {
        Self { subreddit_id: TEA_SUBREDDIT_ID.to_string(), min_score: DEFAULT_MIN_SCORE }
    }
}

impl SubmissionFilter {
    pub fn new(subreddit_id: impl Into<String>, min_score: i64) -> Self {
        Self { subreddit_id: subreddit_id.into(), min_score }
    }

    pub fn from_options(opts: &ScrapeOptions) -> Self {
        Self::new(opts.subreddit_id.clone(), opts.min_score)
    }

    #[inline]
    pub fn matches(&self, rec: &DumpRecord) -> bool {
        // Fullnames are case-sensitive base36; compare verbatim.
        if rec.subreddit_id.as_deref() != Some(self.subreddit_id.as_str()) {
            return false;
        }
        matches!(rec.score, Some(s) if s > self.min_score)
    }
}
