//! Comment tree of one submission and its expansion: every "load more
//! comments" stub is replaced by the comments it stands for, round after round,
//! until none remain.

use crate::error::FetchError;
use crate::things::{Listing, MoreStub, RawComment, Replies, Thing};
use std::collections::{HashSet, VecDeque};

/// Ids per `/api/morechildren` call accepted by Reddit.
pub const MORECHILDREN_BATCH: usize = 100;

/// A flattened comment with the fields the scraper keeps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub name: String,
    pub parent_id: String,
    pub body: String,
    pub body_html: Option<String>,
    pub score: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommentNode {
    Comment { comment: Comment, replies: Vec<CommentNode> },
    More(MoreStub),
}

impl CommentNode {
    pub fn parent_id(&self) -> &str {
        match self {
            CommentNode::Comment { comment, .. } => &comment.parent_id,
            CommentNode::More(stub) => &stub.parent_id,
        }
    }
}

impl From<RawComment> for CommentNode {
    fn from(raw: RawComment) -> Self {
        let replies = match raw.replies {
            Some(Replies::Thing(thing)) => nodes_from_things(vec![*thing]),
            _ => Vec::new(),
        };
        CommentNode::Comment {
            comment: Comment {
                id: raw.id,
                name: raw.name,
                parent_id: raw.parent_id,
                body: raw.body,
                body_html: raw.body_html,
                score: raw.score,
            },
            replies,
        }
    }
}

/// Turn API things into comment nodes. Listings are flattened in place;
/// submissions are not comment nodes and are skipped.
pub fn nodes_from_things(things: Vec<Thing>) -> Vec<CommentNode> {
    let mut out = Vec::with_capacity(things.len());
    for thing in things {
        match thing {
            Thing::Comment(raw) => out.push(raw.into()),
            Thing::More(stub) => out.push(CommentNode::More(stub)),
            Thing::Listing(Listing { children }) => out.extend(nodes_from_things(children)),
            Thing::Link(_) => {}
        }
    }
    out
}

/// Source of the comments hidden behind stubs.
#[allow(async_fn_in_trait)]
pub trait MoreLoader {
    /// Comments for up to `MORECHILDREN_BATCH` ids, flat, each carrying its `parent_id`.
    async fn more_children(&mut self, link_id: &str, children: &[String]) -> Result<Vec<CommentNode>, FetchError>;

    /// Replies of comment `comment_id` (bare id, no `t1_`), for "continue this thread".
    async fn continue_thread(&mut self, submission_id: &str, comment_id: &str) -> Result<Vec<CommentNode>, FetchError>;
}

fn replies_of<'a>(nodes: &'a mut [CommentNode], name: &str) -> Option<&'a mut Vec<CommentNode>> {
    for node in nodes.iter_mut() {
        if let CommentNode::Comment { comment, replies } = node {
            if comment.name == name {
                return Some(replies);
            }
            if let Some(found) = replies_of(replies, name) {
                return Some(found);
            }
        }
    }
    None
}

fn drain_stubs(nodes: &mut Vec<CommentNode>, out: &mut Vec<MoreStub>) {
    let mut kept = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        match node {
            CommentNode::More(stub) => out.push(stub),
            other => kept.push(other),
        }
    }
    *nodes = kept;
    for node in nodes.iter_mut() {
        if let CommentNode::Comment { replies, .. } = node {
            drain_stubs(replies, out);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentForest {
    submission_id: String,
    link_id: String,
    roots: Vec<CommentNode>,
}

impl CommentForest {
    pub fn new(submission_id: impl Into<String>, roots: Vec<CommentNode>) -> Self {
        let submission_id = submission_id.into();
        let link_id = format!("t3_{}", submission_id);
        Self { submission_id, link_id, roots }
    }

    pub fn link_id(&self) -> &str {
        &self.link_id
    }

    pub fn roots(&self) -> &[CommentNode] {
        &self.roots
    }

    /// Remove every stub from the tree; top-level stubs come first.
    pub fn take_stubs(&mut self) -> Vec<MoreStub> {
        let mut out = Vec::new();
        drain_stubs(&mut self.roots, &mut out);
        out
    }

    /// Insert nodes under their parents. Nodes whose parent is the submission,
    /// or whose parent is not in the tree, become top-level.
    pub fn attach(&mut self, nodes: Vec<CommentNode>) {
        for node in nodes {
            let parent = node.parent_id().to_string();
            if parent != self.link_id {
                if let Some(replies) = replies_of(&mut self.roots, &parent) {
                    replies.push(node);
                    continue;
                }
                tracing::debug!(parent = %parent, submission = %self.submission_id, "orphan comment attached at top level");
            }
            self.roots.push(node);
        }
    }

    /// Replace stubs until none are left. `limit` caps the number of stubs
    /// replaced (None = unbounded); stubs past the cap are dropped.
    /// Returns the number of stubs replaced.
    pub async fn expand<L: MoreLoader>(&mut self, loader: &mut L, limit: Option<usize>) -> Result<usize, FetchError> {
        let mut replaced = 0usize;
        let mut seen = HashSet::new();
        loop {
            let stubs = self.take_stubs();
            if stubs.is_empty() {
                break;
            }
            for stub in stubs {
                if limit.is_some_and(|l| replaced >= l) {
                    continue;
                }
                // A stub repeated by the API would otherwise loop forever.
                if !seen.insert(stub.key()) {
                    continue;
                }
                let nodes = if stub.is_continue_thread() {
                    match stub.parent_id.strip_prefix("t1_") {
                        Some(comment_id) => loader.continue_thread(&self.submission_id, comment_id).await?,
                        None => Vec::new(),
                    }
                } else {
                    let mut nodes = Vec::new();
                    for batch in stub.children.chunks(MORECHILDREN_BATCH) {
                        nodes.extend(loader.more_children(&self.link_id, batch).await?);
                    }
                    nodes
                };
                replaced += 1;
                self.attach(nodes);
            }
        }
        Ok(replaced)
    }

    /// All comments, breadth-first (every top-level comment, then their replies, ...).
    pub fn comments(&self) -> Vec<&Comment> {
        let mut out = Vec::new();
        let mut queue: VecDeque<&CommentNode> = self.roots.iter().collect();
        while let Some(node) = queue.pop_front() {
            if let CommentNode::Comment { comment, replies } = node {
                out.push(comment);
                queue.extend(replies.iter());
            }
        }
        out
    }
}
