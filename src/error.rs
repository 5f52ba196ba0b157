//! Error types for each pipeline stage. The pipeline decides per variant
//! whether to keep going (see `FailurePolicy`).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Reading and parsing the submissions dump.
#[derive(Error, Debug)]
pub enum DumpError {
    #[error("cannot open dump {path}: {source}")]
    Open { path: PathBuf, #[source] source: io::Error },

    #[error("read error in {path}: {source}")]
    Read { path: PathBuf, #[source] source: io::Error },

    #[error("malformed JSON at {path}:{line}: {source}")]
    Parse { path: PathBuf, line: u64, #[source] source: serde_json::Error },

    #[error("no monthly dumps found in {0}")]
    NoMonthlyFiles(PathBuf),
}

/// Talking to the Reddit API.
#[derive(Error, Debug)]
pub enum FetchError {
    /// 403: private, quarantined or banned community, or a removed post.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, FetchError::Forbidden(_))
    }
}

/// Talking to PostgreSQL.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("POSTGRES_PW is not set")]
    MissingPassword,

    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("SQL error: {0}")]
    Query(#[from] sqlx::Error),
}
