//! Scraped-item snapshots on disk.
//!
//! A snapshot is the normalized corpus written as a JSON array, one record
//! per item. It can be loaded back to regenerate a persona without Reddit.

use std::path::Path;

use chrono::{DateTime, Utc};
use persona_common::{ItemKind, NormalizedItem, PersonaError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// On-disk shape of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub title: String,
    pub content: String,
    pub subreddit: String,
    pub score: i64,
    /// Seconds since the epoch.
    pub created_utc: f64,
    pub url: String,
    pub post_type: ItemKind,
    #[serde(default)]
    pub parent_context: Option<String>,
}

impl From<&NormalizedItem> for SnapshotRecord {
    fn from(item: &NormalizedItem) -> Self {
        let created_utc =
            item.created_at.timestamp() as f64 + f64::from(item.created_at.timestamp_subsec_millis()) / 1000.0;
        Self {
            title: item.title.clone(),
            content: item.body.clone(),
            subreddit: item.community.clone(),
            score: item.score,
            created_utc,
            url: item.source_url.clone(),
            post_type: item.kind,
            parent_context: item.parent_context.clone(),
        }
    }
}

impl From<SnapshotRecord> for NormalizedItem {
    fn from(record: SnapshotRecord) -> Self {
        let created_at = DateTime::from_timestamp_millis((record.created_utc * 1000.0) as i64)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        NormalizedItem {
            title: record.title,
            body: record.content,
            community: record.subreddit,
            score: record.score,
            created_at,
            source_url: record.url,
            kind: record.post_type,
            parent_context: record.parent_context,
        }
    }
}

pub fn save_snapshot(path: &Path, items: &[NormalizedItem]) -> Result<(), PersonaError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let records: Vec<SnapshotRecord> = items.iter().map(SnapshotRecord::from).collect();
    std::fs::write(path, serde_json::to_string_pretty(&records)?)?;
    info!(path = %path.display(), items = records.len(), "Scraped data saved");
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<Vec<NormalizedItem>, PersonaError> {
    let raw = std::fs::read_to_string(path)?;
    let records: Vec<SnapshotRecord> = serde_json::from_str(&raw)?;
    info!(path = %path.display(), items = records.len(), "Snapshot loaded");
    Ok(records.into_iter().map(NormalizedItem::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{comment_item, post_item};

    #[test]
    fn save_then_load_preserves_items() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scraped_data/owl_scraped_data.json");
        let items = vec![
            post_item("https://reddit.com/r/a/1", "Title", "Body"),
            comment_item("https://reddit.com/r/a/1/c", "Reply", Some("Parent text")),
        ];

        save_snapshot(&path, &items).unwrap();
        assert_eq!(load_snapshot(&path).unwrap(), items);
    }

    #[test]
    fn record_uses_flat_field_names() {
        let record = SnapshotRecord::from(&comment_item("u9", "hi", Some("parent")));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["post_type"], "comment");
        assert_eq!(json["url"], "u9");
        assert_eq!(json["content"], "hi");
        assert_eq!(json["parent_context"], "parent");
        assert!(json["created_utc"].is_f64());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_snapshot(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, PersonaError::Io(_)));
    }

    #[test]
    fn malformed_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not an array").unwrap();
        assert!(matches!(load_snapshot(&path).unwrap_err(), PersonaError::Serialization(_)));
    }
}
