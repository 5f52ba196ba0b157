#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tea_scraper::{
    Comment, CommentForest, CommentNode, FetchError, FetchedSubmission, InsertOutcome, StoreError,
    Submission, SubmissionFetcher, TeaRow, TeaStore, TEA_SUBREDDIT_ID,
};

/// Write a compressed `.zst` dump containing the provided JSONL lines.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Write a plain JSONL dump.
pub fn write_plain_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(path).unwrap();
    for l in lines {
        writeln!(&mut f, "{}", l).unwrap();
    }
}

pub fn dump_line(subreddit_id: &str, score: i64, id: &str) -> String {
    let subreddit = if subreddit_id == TEA_SUBREDDIT_ID { "tea" } else { "coffee" };
    json!({
        "subreddit_id": subreddit_id,
        "subreddit": subreddit,
        "score": score,
        "id": id,
        "permalink": format!("/r/tea/comments/{}/", id),
        "author": "leafy",
        "created_utc": 1670000000,
        "title": format!("post {}", id),
    })
    .to_string()
}

/// A small month of submissions:
/// - t1a (tea, 5), t1b (tea, 2), t1c (tea, 1: at threshold), t1d (tea, 0)
/// - c1 (another community, 50)
/// - t1e (tea, 12)
pub fn tea_month_lines() -> Vec<String> {
    vec![
        dump_line(TEA_SUBREDDIT_ID, 5, "t1a"),
        dump_line(TEA_SUBREDDIT_ID, 2, "t1b"),
        dump_line(TEA_SUBREDDIT_ID, 1, "t1c"),
        dump_line(TEA_SUBREDDIT_ID, 0, "t1d"),
        dump_line("t5_2qhk4", 50, "c1"),
        dump_line(TEA_SUBREDDIT_ID, 12, "t1e"),
    ]
}

/// Fresh temp dir that outlives the test (cleaned up by the OS).
pub fn temp_base() -> PathBuf {
    tempfile::tempdir().unwrap().into_path()
}

pub fn submission(id: &str) -> Submission {
    Submission {
        id: id.to_string(),
        name: format!("t3_{}", id),
        title: format!("Title of {}", id),
        url: format!("https://www.reddit.com/r/tea/comments/{}/", id),
        permalink: format!("/r/tea/comments/{}/", id),
        selftext_html: Some(format!("<div class=\"md\"><p>self text of {}</p></div>", id)),
        created_utc: 1670000000.0,
        score: 5,
        subreddit_id: Some(TEA_SUBREDDIT_ID.to_string()),
    }
}

pub fn comment(id: &str, parent_id: &str, score: i64) -> Comment {
    Comment {
        id: id.to_string(),
        name: format!("t1_{}", id),
        parent_id: parent_id.to_string(),
        body: format!("body {}", id),
        body_html: Some(format!("<p>body {}</p>", id)),
        score,
    }
}

pub fn leaf(id: &str, parent_id: &str, score: i64) -> CommentNode {
    CommentNode::Comment { comment: comment(id, parent_id, score), replies: Vec::new() }
}

/// Submission with flat top-level comments `(id, score)`.
pub fn fetched_with(id: &str, comments: &[(&str, i64)]) -> FetchedSubmission {
    let link = format!("t3_{}", id);
    let roots = comments.iter().map(|(cid, score)| leaf(cid, &link, *score)).collect();
    FetchedSubmission { submission: submission(id), forest: CommentForest::new(id, roots) }
}

pub enum Canned {
    Found(FetchedSubmission),
    Forbidden,
    NotFound,
}

/// Scripted fetcher; ids without a script are served with no comments.
#[derive(Default)]
pub struct FakeFetcher {
    pub script: HashMap<String, Canned>,
    pub calls: Vec<String>,
}

impl FakeFetcher {
    pub fn with(mut self, id: &str, canned: Canned) -> Self {
        self.script.insert(id.to_string(), canned);
        self
    }
}

impl SubmissionFetcher for FakeFetcher {
    async fn fetch(&mut self, id: &str) -> Result<FetchedSubmission, FetchError> {
        self.calls.push(id.to_string());
        match self.script.get(id) {
            Some(Canned::Found(f)) => Ok(f.clone()),
            Some(Canned::Forbidden) => Err(FetchError::Forbidden(format!("/comments/{}", id))),
            Some(Canned::NotFound) => Err(FetchError::NotFound(format!("/comments/{}", id))),
            None => Ok(fetched_with(id, &[])),
        }
    }
}

/// In-memory `tea` table with a unique postid.
#[derive(Default)]
pub struct MemoryStore {
    pub rows: BTreeMap<String, TeaRow>,
    pub fail_on: HashSet<String>,
    pub attempts: Vec<String>,
}

impl TeaStore for MemoryStore {
    async fn insert(&mut self, row: &TeaRow) -> Result<InsertOutcome, StoreError> {
        self.attempts.push(row.postid.clone());
        if self.fail_on.contains(&row.postid) {
            return Err(StoreError::Query(sqlx::Error::Protocol("simulated failure".into())));
        }
        if self.rows.contains_key(&row.postid) {
            return Ok(InsertOutcome::Duplicate);
        }
        self.rows.insert(row.postid.clone(), row.clone());
        Ok(InsertOutcome::Inserted)
    }
}

// ----- Reddit JSON payloads -----

pub fn comment_json(id: &str, parent_id: &str, score: i64, replies: Value) -> Value {
    json!({
        "kind": "t1",
        "data": {
            "id": id,
            "name": format!("t1_{}", id),
            "parent_id": parent_id,
            "body": format!("body {}", id),
            "body_html": format!("<p>body {}</p>", id),
            "score": score,
            "author": "leafy",
            "replies": replies,
        }
    })
}

pub fn more_json(id: &str, parent_id: &str, children: &[&str]) -> Value {
    json!({
        "kind": "more",
        "data": {
            "id": id,
            "name": format!("t1_{}", id),
            "parent_id": parent_id,
            "count": children.len(),
            "depth": 0,
            "children": children,
        }
    })
}

pub fn listing_json(children: Vec<Value>) -> Value {
    json!({ "kind": "Listing", "data": { "after": null, "before": null, "children": children } })
}

pub fn submission_json(id: &str) -> Value {
    json!({
        "kind": "t3",
        "data": {
            "id": id,
            "name": format!("t3_{}", id),
            "title": format!("Title of {}", id),
            "url": format!("https://www.reddit.com/r/tea/comments/{}/", id),
            "permalink": format!("/r/tea/comments/{}/", id),
            "selftext_html": format!("<div class=\"md\"><p>self text of {}</p></div>", id),
            "created_utc": 1670000000.0,
            "score": 5,
            "subreddit_id": TEA_SUBREDDIT_ID,
        }
    })
}

/// `/comments/{id}` page: submission listing followed by the comment listing.
pub fn comment_page_json(id: &str, comments: Vec<Value>) -> Value {
    json!([listing_json(vec![submission_json(id)]), listing_json(comments)])
}

pub fn morechildren_json(things: Vec<Value>) -> Value {
    json!({ "json": { "errors": [], "data": { "things": things } } })
}
