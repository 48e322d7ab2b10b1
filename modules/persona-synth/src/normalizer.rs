//! Raw Reddit records → [`NormalizedItem`].
//!
//! Records arrive as untyped listing `data` objects so that decoding happens
//! here, one item at a time: a record that fails to decode is skipped with a
//! warning and the rest of the batch carries on.

use ai_client::truncate_chars;
use chrono::{DateTime, Utc};
use persona_common::{ItemKind, NormalizedItem};
use reddit_client::{permalink_url, Comment, Submission};
use thiserror::Error;
use tracing::warn;

/// Parent previews are cut to this many characters (plus `...`).
pub const PARENT_CONTEXT_CHARS: usize = 200;

const UNKNOWN_COMMUNITY: &str = "Unknown";
const NO_TITLE: &str = "No title";

/// A fetched record before normalization.
#[derive(Debug, Clone)]
pub enum RawItem {
    Submission(serde_json::Value),
    Comment {
        data: serde_json::Value,
        /// Text of what the comment replies to, resolved by the source.
        parent: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("record does not decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("record has no permalink")]
    MissingPermalink,
}

/// Normalized items plus per-kind counts.
#[derive(Debug, Default)]
pub struct Normalized {
    pub items: Vec<NormalizedItem>,
    pub posts: u32,
    pub comments: u32,
    pub skipped: u32,
}

/// Normalize a batch, preserving input order.
pub fn normalize(raw: Vec<RawItem>) -> Normalized {
    let mut out = Normalized::default();

    for item in raw {
        let result = match &item {
            RawItem::Submission(data) => normalize_submission(data),
            RawItem::Comment { data, parent } => normalize_comment(data, parent.as_deref()),
        };

        match result {
            Ok(normalized) => {
                match normalized.kind {
                    ItemKind::Post => out.posts += 1,
                    ItemKind::Comment => out.comments += 1,
                }
                out.items.push(normalized);
            }
            Err(e) => {
                out.skipped += 1;
                let kind = match item {
                    RawItem::Submission(_) => "submission",
                    RawItem::Comment { .. } => "comment",
                };
                warn!(kind, error = %e, "Skipping malformed item");
            }
        }
    }

    out
}

pub fn normalize_submission(data: &serde_json::Value) -> Result<NormalizedItem, NormalizeError> {
    let post: Submission = serde_json::from_value(data.clone())?;
    let permalink = post.permalink.filter(|p| !p.is_empty()).ok_or(NormalizeError::MissingPermalink)?;

    Ok(NormalizedItem {
        title: post
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string()),
        body: post.selftext.unwrap_or_default(),
        community: community_or_unknown(post.subreddit),
        score: post.score.unwrap_or(0),
        created_at: timestamp(post.created_utc),
        source_url: permalink_url(&permalink),
        kind: ItemKind::Post,
        parent_context: None,
    })
}

pub fn normalize_comment(
    data: &serde_json::Value,
    parent: Option<&str>,
) -> Result<NormalizedItem, NormalizeError> {
    let comment: Comment = serde_json::from_value(data.clone())?;
    let permalink = comment
        .permalink
        .filter(|p| !p.is_empty())
        .ok_or(NormalizeError::MissingPermalink)?;

    let community = community_or_unknown(comment.subreddit);
    let title = if community == UNKNOWN_COMMUNITY {
        "Comment".to_string()
    } else {
        format!("Comment in r/{community}")
    };

    Ok(NormalizedItem {
        title,
        body: comment.body.unwrap_or_default(),
        community,
        score: comment.score.unwrap_or(0),
        created_at: timestamp(comment.created_utc),
        source_url: permalink_url(&permalink),
        kind: ItemKind::Comment,
        parent_context: parent
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| truncate_chars(p, PARENT_CONTEXT_CHARS).into_owned()),
    })
}

fn community_or_unknown(subreddit: Option<String>) -> String {
    subreddit
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_COMMUNITY.to_string())
}

/// Epoch seconds → UTC. Missing or out-of-range values become the epoch.
fn timestamp(created_utc: Option<f64>) -> DateTime<Utc> {
    created_utc
        .filter(|secs| secs.is_finite())
        .and_then(|secs| DateTime::from_timestamp(secs.trunc() as i64, (secs.fract().abs() * 1e9) as u32))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
