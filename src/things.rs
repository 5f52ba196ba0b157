//! Wire model of the Reddit JSON API ("things" tagged by `kind`).
//! Only the fields the scraper reads are declared; serde ignores the rest.

use serde::Deserialize;

/// A tagged Reddit object: `{"kind": "...", "data": {...}}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum Thing {
    #[serde(rename = "t1")]
    Comment(RawComment),
    #[serde(rename = "t3")]
    Link(Submission),
    #[serde(rename = "more")]
    More(MoreStub),
    #[serde(rename = "Listing")]
    Listing(Listing),
}

#[derive(Debug, Default, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// Live submission (`t3`).
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Submission {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub permalink: String,
    /// Rendered self text; null for link posts.
    pub selftext_html: Option<String>,
    /// Epoch seconds; the API sends a float.
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
    pub subreddit_id: Option<String>,
}

/// `replies` is a Listing when present and an empty string otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Replies {
    Thing(Box<Thing>),
    Text(String),
}

/// Comment (`t1`) as sent on the wire, replies still nested.
#[derive(Debug, Deserialize)]
pub struct RawComment {
    pub id: String,
    pub name: String,
    pub parent_id: String,
    #[serde(default)]
    pub body: String,
    pub body_html: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub replies: Option<Replies>,
}

/// "Load more comments" placeholder. With no children it is a
/// "continue this thread" link pointing at `parent_id`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct MoreStub {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub parent_id: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub children: Vec<String>,
}

impl MoreStub {
    pub fn is_continue_thread(&self) -> bool {
        self.children.is_empty()
    }

    /// Identity used to avoid replacing the same stub twice.
    pub fn key(&self) -> String {
        if self.is_continue_thread() {
            format!("{}>{}", self.parent_id, self.id)
        } else {
            self.children.join(",")
        }
    }
}

/// `GET /api/morechildren?api_type=json` body.
#[derive(Debug, Deserialize)]
pub struct MoreChildrenResponse {
    pub json: MoreChildrenJson,
}

#[derive(Debug, Deserialize)]
pub struct MoreChildrenJson {
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    pub data: Option<MoreChildrenData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MoreChildrenData {
    #[serde(default)]
    pub things: Vec<Thing>,
}

/// `POST /api/v1/access_token` body. Reddit reports some failures with
/// status 200 and an `error` field.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: u64,
    pub error: Option<serde_json::Value>,
}
