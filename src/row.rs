use crate::date::utc_from_epoch;
use crate::forest::{Comment, CommentForest};
use crate::things::Submission;
use time::PrimitiveDateTime;

/// One row of the `tea` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeaRow {
    pub postid: String,
    pub title: String,
    pub url: String,
    pub permalink: String,
    pub selftext: Option<String>,
    pub comments: Vec<String>,
    pub created_utc: Option<PrimitiveDateTime>,
}

/// Rendered bodies of comments scoring above zero, in the given order.
/// Falls back to the markdown body when the API omitted `body_html`.
pub fn positive_bodies<'a, I>(comments: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Comment>,
{
    comments
        .into_iter()
        .filter(|c| c.score > 0)
        .map(|c| c.body_html.clone().unwrap_or_else(|| c.body.clone()))
        .collect()
}

impl TeaRow {
    pub fn from_submission(sub: &Submission, forest: &CommentForest) -> Self {
        Self {
            postid: sub.id.clone(),
            title: sub.title.clone(),
            url: sub.url.clone(),
            permalink: sub.permalink.clone(),
            selftext: sub.selftext_html.clone(),
            comments: positive_bodies(forest.comments()),
            created_utc: utc_from_epoch(sub.created_utc),
        }
    }
}
