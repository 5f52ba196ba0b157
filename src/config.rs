use crate::date::YearMonth;
use crate::util::env_nonempty;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fullname of r/tea, the community the scraper keeps.
pub const TEA_SUBREDDIT_ID: &str = "t5_2qq5e";
/// Records must score strictly above this to be fetched.
pub const DEFAULT_MIN_SCORE: i64 = 1;
pub const DEFAULT_DUMP_PATH: &str = "RS_2022-12";
pub const DEFAULT_USER_AGENT: &str = "tea-scraper/0.0.1";

pub const REDDIT_AUTH_BASE: &str = "https://www.reddit.com";
pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Where dump lines come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DumpSource {
    /// A single dump file, plain JSONL or `.zst`.
    File(PathBuf),
    /// A directory of monthly `RS_YYYY-MM[.zst]` dumps, bounds inclusive.
    Monthly {
        dir: PathBuf,
        start: Option<YearMonth>,
        end: Option<YearMonth>,
    },
}

impl DumpSource {
    /// A directory becomes an unbounded monthly source, anything else a single file.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        if path.is_dir() {
            DumpSource::Monthly { dir: path, start: None, end: None }
        } else {
            DumpSource::File(path)
        }
    }
}

/// What the pipeline does after a per-record failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnError {
    Continue,
    Abort,
}

/// Continue-vs-abort decision per error class.
/// The default keeps going past permission-denied fetches and failed inserts,
/// and stops on any other fetch failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FailurePolicy {
    pub forbidden: OnError,
    pub fetch: OnError,
    pub insert: OnError,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self { forbidden: OnError::Continue, fetch: OnError::Abort, insert: OnError::Continue }
    }
}

/// String that never shows up in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Reddit API access.
#[derive(Clone, Debug)]
pub struct RedditSettings {
    pub client_id: String,
    pub client_secret: Secret,
    pub user_agent: String,
    pub auth_base: String,
    pub api_base: String,
    pub timeout: Duration,
    pub comment_limit: u32,
    pub comment_sort: String,
    /// Maximum number of "more comments" stubs to replace; None = unbounded.
    pub expand_limit: Option<usize>,
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: Secret::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            auth_base: REDDIT_AUTH_BASE.to_string(),
            api_base: REDDIT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            comment_limit: 2048,
            comment_sort: "confidence".to_string(),
            expand_limit: None,
        }
    }
}

/// PostgreSQL connection parameters. The password has no default.
#[derive(Clone, Debug)]
pub struct PgSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<Secret>,
    /// Run `CREATE TABLE IF NOT EXISTS tea ...` after connecting.
    pub bootstrap_schema: bool,
}

impl Default for PgSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "tea".to_string(),
            user: "tea".to_string(),
            password: None,
            bootstrap_schema: false,
        }
    }
}

/// Everything a run needs, passed explicitly into the pipeline.
#[derive(Clone, Debug)]
pub struct ScrapeOptions {
    pub source: DumpSource,
    pub subreddit_id: String,
    pub min_score: i64,
    pub reddit: RedditSettings,
    pub postgres: PgSettings,
    pub policy: FailurePolicy,
    pub progress: bool,
    pub progress_label: Option<String>,
    pub read_buffer_bytes: usize,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            source: DumpSource::File(PathBuf::from(DEFAULT_DUMP_PATH)),
            subreddit_id: TEA_SUBREDDIT_ID.to_string(),
            min_score: DEFAULT_MIN_SCORE,
            reddit: RedditSettings::default(),
            postgres: PgSettings::default(),
            policy: FailurePolicy::default(),
            progress: true,
            progress_label: None,
            read_buffer_bytes: 256 * 1024,
        }
    }
}

impl ScrapeOptions {
    /// Defaults overlaid with environment variables:
    /// - TEA_DUMP_PATH (file or directory of monthly dumps)
    /// - REDDIT_CLIENT_ID, REDDIT_CLIENT_SECRET, REDDIT_USER_AGENT
    /// - POSTGRES_HOST, POSTGRES_PORT, POSTGRES_DB, POSTGRES_USER, POSTGRES_PW
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Some(p) = env_nonempty("TEA_DUMP_PATH") {
            opts.source = DumpSource::from_path(p);
        }
        if let Some(v) = env_nonempty("REDDIT_CLIENT_ID") {
            opts.reddit.client_id = v;
        }
        if let Some(v) = env_nonempty("REDDIT_CLIENT_SECRET") {
            opts.reddit.client_secret = Secret::new(v);
        }
        if let Some(v) = env_nonempty("REDDIT_USER_AGENT") {
            opts.reddit.user_agent = v;
        }
        if let Some(v) = env_nonempty("POSTGRES_HOST") {
            opts.postgres.host = v;
        }
        if let Some(v) = env_nonempty("POSTGRES_PORT") {
            match v.parse() {
                Ok(port) => opts.postgres.port = port,
                Err(_) => tracing::warn!("POSTGRES_PORT is not a valid port: {}", v),
            }
        }
        if let Some(v) = env_nonempty("POSTGRES_DB") {
            opts.postgres.database = v;
        }
        if let Some(v) = env_nonempty("POSTGRES_USER") {
            opts.postgres.user = v;
        }
        // POSTGRES_PW is read verbatim; a password may legitimately contain spaces.
        if let Ok(v) = std::env::var("POSTGRES_PW") {
            opts.postgres.password = Some(Secret::new(v));
        }
        opts
    }

    pub fn with_source(mut self, source: DumpSource) -> Self {
        self.source = source;
        self
    }
    pub fn with_dump_path(mut self, path: impl AsRef<Path>) -> Self {
        self.source = DumpSource::from_path(path);
        self
    }
    pub fn with_subreddit_id(mut self, id: impl AsRef<str>) -> Self {
        self.subreddit_id = id.as_ref().trim().to_string();
        self
    }
    pub fn with_min_score(mut self, score: i64) -> Self {
        self.min_score = score;
        self
    }
    pub fn with_reddit(mut self, reddit: RedditSettings) -> Self {
        self.reddit = reddit;
        self
    }
    pub fn with_postgres(mut self, pg: PgSettings) -> Self {
        self.postgres = pg;
        self
    }
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_io_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer_bytes = bytes.max(8 * 1024);
        self
    }
}
