//! Reddit API client: application-only OAuth, submission lookup with its
//! comment listing, and the two endpoints used to expand collapsed threads.

use crate::config::RedditSettings;
use crate::error::FetchError;
use crate::forest::{nodes_from_things, CommentForest, CommentNode, MoreLoader};
use crate::things::{MoreChildrenResponse, Submission, Thing, TokenResponse};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

/// Refresh the token this long before Reddit says it expires.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

struct Token {
    value: String,
    expires_at: Instant,
}

pub struct RedditClient {
    http: Client,
    settings: RedditSettings,
    token: Option<Token>,
}

/// A live submission with its comment tree.
#[derive(Clone, Debug)]
pub struct FetchedSubmission {
    pub submission: Submission,
    pub forest: CommentForest,
}

fn map_status(status: StatusCode, url: &str) -> FetchError {
    match status {
        StatusCode::FORBIDDEN => FetchError::Forbidden(url.to_string()),
        StatusCode::NOT_FOUND => FetchError::NotFound(url.to_string()),
        StatusCode::UNAUTHORIZED => FetchError::Auth(format!("401 from {}", url)),
        other => FetchError::Status { status: other.as_u16(), url: url.to_string() },
    }
}

async fn decode<T: DeserializeOwned>(resp: Response, url: &str) -> Result<T, FetchError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(map_status(status, url));
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(format!("{}: {}", url, e)))
}

/// `/comments/{id}` answers with `[submission listing, comment listing]`.
fn split_comment_page(page: Vec<Thing>, url: &str) -> Result<(Option<Submission>, Vec<CommentNode>), FetchError> {
    let mut it = page.into_iter();
    let (Some(Thing::Listing(head)), Some(Thing::Listing(comments))) = (it.next(), it.next()) else {
        return Err(FetchError::Decode(format!("{}: expected two listings", url)));
    };
    let submission = head.children.into_iter().find_map(|t| match t {
        Thing::Link(s) => Some(s),
        _ => None,
    });
    Ok((submission, nodes_from_things(comments.children)))
}

impl RedditClient {
    pub fn new(settings: RedditSettings) -> Result<Self, FetchError> {
        let http = ClientBuilder::new()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self { http, settings, token: None })
    }

    async fn bearer(&mut self) -> Result<String, FetchError> {
        if let Some(tok) = &self.token {
            if Instant::now() < tok.expires_at {
                return Ok(tok.value.clone());
            }
        }
        let url = format!("{}/api/v1/access_token", self.settings.auth_base.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.settings.client_id, Some(self.settings.client_secret.expose()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let body: TokenResponse = decode(resp, &url).await.map_err(|e| match e {
            FetchError::Forbidden(u) | FetchError::NotFound(u) => FetchError::Auth(u),
            other => other,
        })?;
        if let Some(err) = body.error {
            return Err(FetchError::Auth(err.to_string()));
        }
        let value = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FetchError::Auth("token response without access_token".to_string()))?;
        let ttl = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_SLACK);
        tracing::debug!(expires_in = body.expires_in, "obtained Reddit access token");
        self.token = Some(Token { value: value.clone(), expires_at: Instant::now() + ttl });
        Ok(value)
    }

    async fn get_json<T: DeserializeOwned>(&mut self, path: &str, query: &[(&str, String)]) -> Result<T, FetchError> {
        let token = self.bearer().await?;
        let url = format!("{}{}", self.settings.api_base.trim_end_matches('/'), path);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("raw_json", "1")])
            .query(query)
            .send()
            .await?;
        decode(resp, &url).await
    }

    fn page_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("limit", self.settings.comment_limit.to_string()),
            ("sort", self.settings.comment_sort.clone()),
        ]
    }

    /// Fetch a submission and its top-level comment listing, stubs unexpanded.
    pub async fn submission(&mut self, id: &str) -> Result<FetchedSubmission, FetchError> {
        let path = format!("/comments/{}", id);
        let query = self.page_query();
        let page: Vec<Thing> = self.get_json(&path, &query).await?;
        let (submission, roots) = split_comment_page(page, &path)?;
        let submission = submission.ok_or_else(|| FetchError::Decode(format!("{}: no submission in response", path)))?;
        let forest = CommentForest::new(submission.id.clone(), roots);
        Ok(FetchedSubmission { submission, forest })
    }

    /// Fetch a submission and expand its whole comment tree.
    pub async fn submission_with_comments(&mut self, id: &str) -> Result<FetchedSubmission, FetchError> {
        let mut fetched = self.submission(id).await?;
        let limit = self.settings.expand_limit;
        let replaced = fetched.forest.expand(self, limit).await?;
        tracing::debug!(id = %id, replaced, "expanded comment tree");
        Ok(fetched)
    }
}

impl MoreLoader for RedditClient {
    async fn more_children(&mut self, link_id: &str, children: &[String]) -> Result<Vec<CommentNode>, FetchError> {
        let query = vec![
            ("api_type", "json".to_string()),
            ("link_id", link_id.to_string()),
            ("children", children.join(",")),
            ("sort", self.settings.comment_sort.clone()),
        ];
        let resp: MoreChildrenResponse = self.get_json("/api/morechildren", &query).await?;
        if !resp.json.errors.is_empty() {
            return Err(FetchError::Decode(format!(
                "/api/morechildren for {}: {}",
                link_id,
                serde_json::Value::Array(resp.json.errors)
            )));
        }
        let things = resp.json.data.map(|d| d.things).unwrap_or_default();
        Ok(nodes_from_things(things))
    }

    async fn continue_thread(&mut self, submission_id: &str, comment_id: &str) -> Result<Vec<CommentNode>, FetchError> {
        let path = format!("/comments/{}/_/{}", submission_id, comment_id);
        let query = self.page_query();
        let page: Vec<Thing> = self.get_json(&path, &query).await?;
        let (_, nodes) = split_comment_page(page, &path)?;
        // The page is rooted at the comment itself; hand back its replies.
        let parent = format!("t1_{}", comment_id);
        for node in nodes {
            if let CommentNode::Comment { comment, replies } = node {
                if comment.name == parent {
                    return Ok(replies);
                }
            }
        }
        Ok(Vec::new())
    }
}
