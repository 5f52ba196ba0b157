use crate::api::{FetchedSubmission, RedditClient};
use crate::config::{DumpSource, FailurePolicy, OnError, PgSettings, RedditSettings, ScrapeOptions};
use crate::dump::{DumpReader, DumpRecord};
use crate::error::FetchError;
use crate::filters::SubmissionFilter;
use crate::paths::plan_dump_files;
use crate::progress::{make_progress_bar_labeled, total_dump_size};
use crate::row::TeaRow;
use crate::store::{InsertOutcome, PgTeaStore, TeaStore};
use crate::util::init_tracing_once;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::path::Path;

/// Anything that can produce a live submission with its fully expanded comment tree.
#[allow(async_fn_in_trait)]
pub trait SubmissionFetcher {
    async fn fetch(&mut self, id: &str) -> Result<FetchedSubmission, FetchError>;
}

impl SubmissionFetcher for RedditClient {
    async fn fetch(&mut self, id: &str) -> Result<FetchedSubmission, FetchError> {
        self.submission_with_comments(id).await
    }
}

/// Counters for one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub files_read: u64,
    pub lines_read: u64,
    pub matched: u64,
    /// Matching records without an `id` to look up.
    pub missing_id: u64,
    pub fetched: u64,
    pub inserted: u64,
    pub duplicates: u64,
    pub forbidden: u64,
    pub fetch_failures: u64,
    pub insert_failures: u64,
}

/// Keep going or turn `err` into the run's error, per `policy`.
fn settle<E>(policy: OnError, err: E, ctx: String) -> Result<()>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match policy {
        OnError::Continue => Ok(()),
        OnError::Abort => Err(anyhow::Error::new(err).context(ctx)),
    }
}

/// Log without tearing the progress bar.
fn above_bar(pb: Option<&ProgressBar>, log: impl FnOnce()) {
    match pb {
        Some(pb) => pb.suspend(log),
        None => log(),
    }
}

#[derive(Clone, Debug, Default)]
pub struct TeaScraper {
    pub(crate) opts: ScrapeOptions,
}

impl TeaScraper {
    pub fn new() -> Self {
        Self { opts: ScrapeOptions::default() }
    }

    pub fn from_options(opts: ScrapeOptions) -> Self {
        Self { opts }
    }

    // -------- Builder methods --------
    pub fn source(mut self, source: DumpSource) -> Self { self.opts = self.opts.with_source(source); self }
    pub fn dump_path(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_dump_path(path); self }
    pub fn subreddit_id(mut self, id: impl AsRef<str>) -> Self { self.opts = self.opts.with_subreddit_id(id); self }
    pub fn min_score(mut self, score: i64) -> Self { self.opts = self.opts.with_min_score(score); self }
    pub fn reddit(mut self, reddit: RedditSettings) -> Self { self.opts = self.opts.with_reddit(reddit); self }
    pub fn postgres(mut self, pg: PgSettings) -> Self { self.opts = self.opts.with_postgres(pg); self }
    pub fn policy(mut self, policy: FailurePolicy) -> Self { self.opts = self.opts.with_policy(policy); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn io_read_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_read_buffer(bytes); self }

    /// Stream the dump and return only the records the filter keeps. No network, no database.
    pub fn matching_records(&self) -> Result<Vec<DumpRecord>> {
        let filter = SubmissionFilter::from_options(&self.opts);
        let mut out = Vec::new();
        for file in plan_dump_files(&self.opts.source)? {
            let reader = DumpReader::open(&file, self.opts.read_buffer_bytes)?;
            for rec in reader {
                let rec = rec?;
                if filter.matches(&rec) {
                    out.push(rec);
                }
            }
        }
        Ok(out)
    }

    /// Filter → fetch → insert, one record at a time, with the given fetcher and store.
    pub async fn run<F, S>(&self, fetcher: &mut F, store: &mut S) -> Result<RunReport>
    where
        F: SubmissionFetcher,
        S: TeaStore,
    {
        init_tracing_once();
        let files = plan_dump_files(&self.opts.source)?;
        tracing::info!("Planned {} dump file(s) for processing.", files.len());

        let filter = SubmissionFilter::from_options(&self.opts);
        let pb = if self.opts.progress {
            Some(make_progress_bar_labeled(total_dump_size(&files), self.opts.progress_label.as_deref()))
        } else {
            None
        };

        let mut report = RunReport::default();
        for file in &files {
            let mut reader = DumpReader::open(file, self.opts.read_buffer_bytes)?;
            let mut last = 0u64;
            while let Some(rec) = reader.next() {
                let rec = rec?;
                report.lines_read += 1;
                if let Some(pb) = &pb {
                    let cur = reader.bytes_read();
                    pb.inc(cur.saturating_sub(last));
                    last = cur;
                }
                if !filter.matches(&rec) {
                    continue;
                }
                report.matched += 1;
                self.process_record(&rec, fetcher, store, &mut report, pb.as_ref()).await?;
            }
            if let Some(pb) = &pb {
                pb.inc(reader.bytes_read().saturating_sub(last));
            }
            report.files_read += 1;
        }

        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }
        tracing::info!(
            matched = report.matched,
            inserted = report.inserted,
            duplicates = report.duplicates,
            forbidden = report.forbidden,
            "run finished"
        );
        Ok(report)
    }

    async fn process_record<F, S>(
        &self,
        rec: &DumpRecord,
        fetcher: &mut F,
        store: &mut S,
        report: &mut RunReport,
        pb: Option<&ProgressBar>,
    ) -> Result<()>
    where
        F: SubmissionFetcher,
        S: TeaStore,
    {
        let Some(id) = rec.id.as_deref() else {
            report.missing_id += 1;
            above_bar(pb, || tracing::warn!(permalink = ?rec.permalink, "matching record has no id; skipped"));
            return Ok(());
        };
        let permalink = rec.permalink.as_deref().unwrap_or("");
        above_bar(pb, || tracing::info!(id = %id, "{}", permalink));

        let fetched = match fetcher.fetch(id).await {
            Ok(f) => f,
            Err(e) if e.is_forbidden() => {
                report.forbidden += 1;
                above_bar(pb, || tracing::warn!("Failed to get {}: {}", id, e));
                return settle(self.opts.policy.forbidden, e, format!("fetching submission {}", id));
            }
            Err(e) => {
                report.fetch_failures += 1;
                above_bar(pb, || tracing::error!("Failed to get {}: {}", id, e));
                return settle(self.opts.policy.fetch, e, format!("fetching submission {}", id));
            }
        };
        report.fetched += 1;

        let row = TeaRow::from_submission(&fetched.submission, &fetched.forest);
        match store.insert(&row).await {
            Ok(InsertOutcome::Inserted) => {
                report.inserted += 1;
                tracing::debug!(postid = %row.postid, comments = row.comments.len(), "row inserted");
            }
            Ok(InsertOutcome::Duplicate) => {
                report.duplicates += 1;
                tracing::debug!(postid = %row.postid, "row already present");
            }
            Err(e) => {
                report.insert_failures += 1;
                above_bar(pb, || tracing::error!(postid = %row.postid, error = %e, "insert failed"));
                return settle(self.opts.policy.insert, e, format!("inserting row {}", row.postid));
            }
        }
        Ok(())
    }

    /// Full run against Reddit and PostgreSQL.
    ///
    /// A failed database connection is logged and the run is skipped
    /// (`Ok(None)`). Otherwise the connection is closed before returning,
    /// whether the run succeeded or not.
    pub async fn run_live(&self) -> Result<Option<RunReport>> {
        init_tracing_once();
        let mut store = match PgTeaStore::connect(&self.opts.postgres).await {
            Ok(store) => store,
            Err(e) => {
                tracing::error!(error = %e, "database unavailable; no submissions will be processed");
                return Ok(None);
            }
        };

        let outcome = match RedditClient::new(self.opts.reddit.clone()).context("building Reddit client") {
            Ok(mut client) => self.run(&mut client, &mut store).await,
            Err(e) => Err(e),
        };

        if let Err(e) = store.close().await {
            tracing::warn!(error = %e, "closing database connection failed");
        }
        outcome.map(Some)
    }
}
