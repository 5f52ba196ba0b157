use crate::config::DumpSource;
use crate::date::YearMonth;
use crate::error::DumpError;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// One dump file to read, in the order it should be read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DumpFile {
    pub ym: Option<YearMonth>,
    pub path: PathBuf,
}

impl DumpFile {
    pub fn is_zstd(&self) -> bool {
        is_zstd_path(&self.path)
    }
}

pub fn is_zstd_path(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("zst"))
}

fn monthly_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^RS_(\d{4})-(\d{2})(\.zst)?$").expect("static regex"))
}

/// Parse `RS_YYYY-MM` / `RS_YYYY-MM.zst` file names.
pub fn month_of_dump_name(name: &str) -> Option<YearMonth> {
    let caps = monthly_name_re().captures(name)?;
    format!("{}-{}", &caps[1], &caps[2]).parse().ok()
}

/// Map each month to its dump file. When both `RS_YYYY-MM` and
/// `RS_YYYY-MM.zst` exist the compressed one wins.
fn discover_monthly(dir: &Path) -> BTreeMap<YearMonth, PathBuf> {
    let mut map: BTreeMap<YearMonth, PathBuf> = BTreeMap::new();
    for ent in WalkDir::new(dir).min_depth(1).max_depth(1).into_iter().flatten() {
        if !ent.file_type().is_file() {
            continue;
        }
        let Some(name) = ent.file_name().to_str() else { continue };
        let Some(ym) = month_of_dump_name(name) else { continue };
        let path = ent.path().to_path_buf();
        match map.get(&ym) {
            Some(existing) if is_zstd_path(existing) => {}
            _ => {
                map.insert(ym, path);
            }
        }
    }
    map
}

/// Resolve a source into the ordered list of files to read.
/// A single-file source is returned as-is; opening it reports a missing file.
pub fn plan_dump_files(source: &DumpSource) -> Result<Vec<DumpFile>, DumpError> {
    match source {
        DumpSource::File(path) => Ok(vec![DumpFile {
            ym: path.file_name().and_then(|n| n.to_str()).and_then(month_of_dump_name),
            path: path.clone(),
        }]),
        DumpSource::Monthly { dir, start, end } => {
            if !dir.is_dir() {
                return Err(DumpError::Open {
                    path: dir.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "dump directory not found"),
                });
            }
            let files: Vec<DumpFile> = discover_monthly(dir)
                .into_iter()
                .filter(|(ym, _)| ym.within(*start, *end))
                .map(|(ym, path)| DumpFile { ym: Some(ym), path })
                .collect();
            if files.is_empty() {
                return Err(DumpError::NoMonthlyFiles(dir.clone()));
            }
            Ok(files)
        }
    }
}
