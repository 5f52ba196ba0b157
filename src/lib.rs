mod config;
mod date;
mod error;
mod paths;
mod util;

mod dump;
mod filters;
mod progress;

mod api;
mod forest;
mod things;

mod pipeline;
mod row;
mod store;

pub use crate::config::{
    DumpSource, FailurePolicy, OnError, PgSettings, RedditSettings, ScrapeOptions, Secret,
    DEFAULT_DUMP_PATH, DEFAULT_MIN_SCORE, DEFAULT_USER_AGENT, TEA_SUBREDDIT_ID,
};
pub use crate::date::{utc_from_epoch, YearMonth};
pub use crate::error::{DumpError, FetchError, StoreError};
pub use crate::pipeline::{RunReport, SubmissionFetcher, TeaScraper};

// dump reading and filtering
pub use crate::dump::{parse_record, DumpReader, DumpRecord};
pub use crate::filters::SubmissionFilter;
pub use crate::paths::{month_of_dump_name, plan_dump_files, DumpFile};

// Reddit API and comment trees
pub use crate::api::{FetchedSubmission, RedditClient};
pub use crate::forest::{nodes_from_things, Comment, CommentForest, CommentNode, MoreLoader, MORECHILDREN_BATCH};
pub use crate::things::{MoreStub, Submission, Thing};

// rows and storage
pub use crate::row::{positive_bodies, TeaRow};
pub use crate::store::{InsertOutcome, PgTeaStore, TeaStore, CREATE_TEA_TABLE};

pub use crate::util::init_tracing_once;
