// Acquisition boundary for the persona pipeline.
//
// ItemSource yields normalized items for a username. RedditSource fetches
// live, SnapshotSource replays a saved corpus, MockItemSource serves tests.

use async_trait::async_trait;
use persona_common::{NormalizedItem, PersonaError};
use serde::Serialize;

use crate::normalizer::Normalized;

/// Counts reported by acquisition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeStats {
    pub posts: u32,
    pub comments: u32,
    /// Records dropped during normalization.
    pub skipped: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Acquired {
    /// Posts first, then comments, each newest first.
    pub items: Vec<NormalizedItem>,
    pub stats: ScrapeStats,
}

impl From<Normalized> for Acquired {
    fn from(normalized: Normalized) -> Self {
        Self {
            stats: ScrapeStats {
                posts: normalized.posts,
                comments: normalized.comments,
                skipped: normalized.skipped,
            },
            items: normalized.items,
        }
    }
}

#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch and normalize everything available for `username`.
    async fn acquire(&self, username: &str) -> Result<Acquired, PersonaError>;

    /// Whether acquired items should be written out as a snapshot.
    fn persists_snapshot(&self) -> bool {
        true
    }
}
