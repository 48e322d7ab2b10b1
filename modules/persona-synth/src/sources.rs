use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use persona_common::{ItemKind, PersonaError};
use reddit_client::types::{COMMENT_KIND, SUBMISSION_KIND};
use reddit_client::{RedditClient, RedditError, Thing};
use tracing::{info, warn};

use crate::normalizer::{normalize, RawItem};
use crate::snapshot::load_snapshot;
use crate::traits::{Acquired, ItemSource, ScrapeStats};

// ---------------------------------------------------------------------------
// RedditSource
// ---------------------------------------------------------------------------

/// Live acquisition through the Reddit API.
pub struct RedditSource {
    client: RedditClient,
    limit: u32,
}

impl RedditSource {
    pub fn new(client: RedditClient, limit: u32) -> Self {
        Self { client, limit }
    }

    /// Bodies of parent comments, keyed by fullname. Lookup failures only
    /// cost context, so they are logged and yield an empty map.
    async fn parent_bodies(&self, comments: &[serde_json::Value]) -> HashMap<String, String> {
        let fullnames = reply_parent_ids(comments);
        if fullnames.is_empty() {
            return HashMap::new();
        }

        match self.client.things_by_fullname(&fullnames).await {
            Ok(things) => comment_bodies(things),
            Err(e) => {
                warn!(error = %e, parents = fullnames.len(), "Could not fetch parent comments");
                HashMap::new()
            }
        }
    }
}

fn acquisition_error(e: RedditError) -> PersonaError {
    PersonaError::Acquisition(e.to_string())
}

#[async_trait]
impl ItemSource for RedditSource {
    async fn acquire(&self, username: &str) -> Result<Acquired, PersonaError> {
        info!(username, limit = self.limit, "Scraping data for user");

        let submissions = self
            .client
            .user_submissions(username, self.limit)
            .await
            .map_err(acquisition_error)?;
        let comments = self
            .client
            .user_comments(username, self.limit)
            .await
            .map_err(acquisition_error)?;

        let parents = self.parent_bodies(&comments).await;
        let raw = attach_parents(submissions, comments, &parents);
        let acquired = Acquired::from(normalize(raw));

        info!(
            username,
            posts = acquired.stats.posts,
            comments = acquired.stats.comments,
            skipped = acquired.stats.skipped,
            "Scraped user data"
        );
        Ok(acquired)
    }
}

/// Distinct `t1_` parent ids, in first-seen order.
fn reply_parent_ids(comments: &[serde_json::Value]) -> Vec<String> {
    let prefix = format!("{COMMENT_KIND}_");
    let mut ids: Vec<String> = Vec::new();
    for comment in comments {
        if let Some(id) = comment.get("parent_id").and_then(|v| v.as_str()) {
            if id.starts_with(&prefix) && !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
    }
    ids
}

fn comment_bodies(things: Vec<Thing>) -> HashMap<String, String> {
    things
        .into_iter()
        .filter(|thing| thing.kind == COMMENT_KIND)
        .filter_map(|thing| {
            let name = thing.data.get("name")?.as_str()?.to_string();
            let body = thing.data.get("body")?.as_str()?.to_string();
            Some((name, body))
        })
        .collect()
}

/// Posts first, then comments with their parent text: the parent comment's
/// body for replies, the submission title for top-level comments.
fn attach_parents(
    submissions: Vec<serde_json::Value>,
    comments: Vec<serde_json::Value>,
    parents: &HashMap<String, String>,
) -> Vec<RawItem> {
    let submission_prefix = format!("{SUBMISSION_KIND}_");

    let posts = submissions.into_iter().map(RawItem::Submission);
    let replies = comments.into_iter().map(|data| {
        let parent_id = data.get("parent_id").and_then(|v| v.as_str()).unwrap_or_default();
        let parent = if parent_id.starts_with(&submission_prefix) {
            data.get("link_title").and_then(|v| v.as_str()).map(str::to_string)
        } else {
            parents.get(parent_id).cloned()
        };
        RawItem::Comment { data, parent }
    });

    posts.chain(replies).collect()
}

// ---------------------------------------------------------------------------
// SnapshotSource
// ---------------------------------------------------------------------------

/// Replays a saved snapshot. The whole snapshot is used, whatever the limit.
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ItemSource for SnapshotSource {
    async fn acquire(&self, username: &str) -> Result<Acquired, PersonaError> {
        let items = load_snapshot(&self.path)?;
        let posts = items.iter().filter(|i| i.kind == ItemKind::Post).count() as u32;
        let comments = items.len() as u32 - posts;
        info!(username, path = %self.path.display(), posts, comments, "Replaying snapshot");

        Ok(Acquired {
            items,
            stats: ScrapeStats {
                posts,
                comments,
                skipped: 0,
            },
        })
    }

    fn persists_snapshot(&self) -> bool {
        false
    }
}
