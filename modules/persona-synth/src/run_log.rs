//! Execution log: one JSON array of run records, appended after every run.
//!
//! The file lives at `{DATA_DIR}/logs/execution_log.json`. Records from older
//! versions are kept as raw JSON so appending never drops history.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

pub const EXECUTION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One run, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub username: String,
    pub execution_time: String,
    /// Seconds.
    pub duration: f64,
    pub posts_scraped: u32,
    pub comments_scraped: u32,
    pub total_content: u32,
    pub persona_generated: bool,
    pub error_message: Option<String>,
    pub model_used: String,
}

/// A run between [`ExecutionLog::begin`] and [`ExecutionLog::finish`].
#[derive(Debug)]
pub struct ActiveRun {
    record: ExecutionRecord,
    started: Instant,
}

impl ActiveRun {
    pub fn record_scrape(&mut self, posts: u32, comments: u32, total: u32) {
        self.record.posts_scraped = posts;
        self.record.comments_scraped = comments;
        self.record.total_content = total;
    }

    pub fn execution_time(&self) -> &str {
        &self.record.execution_time
    }
}

/// Aggregate view over every recorded run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionStats {
    pub total_executions: usize,
    pub successful: usize,
    pub failed: usize,
    /// Percent, 0–100.
    pub success_rate: f64,
    pub last_execution: String,
}

impl std::fmt::Display for ExecutionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total executions: {}", self.total_executions)?;
        writeln!(f, "Successful: {}", self.successful)?;
        writeln!(f, "Failed: {}", self.failed)?;
        writeln!(f, "Success rate: {:.1}%", self.success_rate)?;
        write!(f, "Last execution: {}", self.last_execution)
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionLog {
    path: PathBuf,
}

impl ExecutionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start timing a run. Nothing is written until [`finish`](Self::finish).
    pub fn begin(&self, username: &str, model: &str) -> ActiveRun {
        ActiveRun {
            record: ExecutionRecord {
                username: username.to_string(),
                execution_time: Local::now().format(EXECUTION_TIME_FORMAT).to_string(),
                duration: 0.0,
                posts_scraped: 0,
                comments_scraped: 0,
                total_content: 0,
                persona_generated: false,
                error_message: None,
                model_used: model.to_string(),
            },
            started: Instant::now(),
        }
    }

    /// Close a run and append its record. `Err` carries the failure message.
    pub fn finish(&self, run: ActiveRun, outcome: std::result::Result<(), String>) -> Result<ExecutionRecord> {
        let mut record = run.record;
        record.duration = run.started.elapsed().as_secs_f64();
        match outcome {
            Ok(()) => record.persona_generated = true,
            Err(message) => {
                record.persona_generated = false;
                record.error_message = Some(message);
            }
        }
        self.append(&record)?;
        Ok(record)
    }

    pub fn append(&self, record: &ExecutionRecord) -> Result<()> {
        let mut entries = self.load();
        entries.push(serde_json::to_value(record)?);

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&entries)?)
            .with_context(|| format!("writing execution log {}", self.path.display()))?;

        match &record.error_message {
            Some(message) => error!(
                username = record.username.as_str(),
                error = message.as_str(),
                "Execution failed"
            ),
            None => info!(
                username = record.username.as_str(),
                duration_secs = record.duration,
                "Execution succeeded"
            ),
        }
        Ok(())
    }

    /// Every stored entry. A missing or unreadable file reads as empty.
    pub fn load(&self) -> Vec<serde_json::Value> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read execution log");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Execution log is corrupt, starting fresh");
                Vec::new()
            }
        }
    }

    pub fn stats(&self) -> ExecutionStats {
        let entries = self.load();
        let total = entries.len();
        let successful = entries
            .iter()
            .filter(|entry| entry.get("persona_generated").and_then(|v| v.as_bool()).unwrap_or(false))
            .count();
        let last_execution = entries
            .last()
            .and_then(|entry| entry.get("execution_time"))
            .and_then(|v| v.as_str())
            .unwrap_or("Never")
            .to_string();

        ExecutionStats {
            total_executions: total,
            successful,
            failed: total - successful,
            success_rate: if total == 0 {
                0.0
            } else {
                successful as f64 / total as f64 * 100.0
            },
            last_execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_in(dir: &tempfile::TempDir) -> ExecutionLog {
        ExecutionLog::new(dir.path().join("logs/execution_log.json"))
    }

    #[test]
    fn empty_log_stats() {
        let dir = tempfile::tempdir().unwrap();
        let stats = log_in(&dir).stats();
        assert_eq!(stats.total_executions, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.last_execution, "Never");
    }

    #[test]
    fn finish_appends_success_and_failure() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);

        let mut run = log.begin("owl", "mistral");
        run.record_scrape(3, 4, 7);
        let ok = log.finish(run, Ok(())).unwrap();
        assert!(ok.persona_generated);
        assert_eq!(ok.total_content, 7);
        assert!(ok.error_message.is_none());

        let run = log.begin("ghost", "mistral");
        let failed = log.finish(run, Err("No posts or comments found".into())).unwrap();
        assert!(!failed.persona_generated);

        let entries = log.load();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["username"], "ghost");
        assert_eq!(entries[1]["error_message"], "No posts or comments found");
        for key in [
            "username",
            "execution_time",
            "duration",
            "posts_scraped",
            "comments_scraped",
            "total_content",
            "persona_generated",
            "error_message",
            "model_used",
        ] {
            assert!(entries[0].get(key).is_some(), "missing {key}");
        }

        let stats = log.stats();
        assert_eq!(stats.total_executions, 2);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.success_rate, 50.0);
        assert_eq!(stats.last_execution, failed.execution_time);
    }

    #[test]
    fn corrupt_file_reads_as_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        std::fs::create_dir_all(log.path().parent().unwrap()).unwrap();
        std::fs::write(log.path(), "[{oops").unwrap();

        assert!(log.load().is_empty());
        let run = log.begin("owl", "mistral");
        log.finish(run, Ok(())).unwrap();
        assert_eq!(log.load().len(), 1);
    }

    #[test]
    fn unknown_entries_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let log = log_in(&dir);
        std::fs::create_dir_all(log.path().parent().unwrap()).unwrap();
        std::fs::write(log.path(), r#"[{"legacy": true}]"#).unwrap();

        let run = log.begin("owl", "mistral");
        log.finish(run, Ok(())).unwrap();

        let entries = log.load();
        assert_eq!(entries[0], serde_json::json!({"legacy": true}));
        assert_eq!(log.stats().failed, 1);
    }

    #[test]
    fn stats_display() {
        let stats = ExecutionStats {
            total_executions: 4,
            successful: 3,
            failed: 1,
            success_rate: 75.0,
            last_execution: "2024-01-01 10:00:00".into(),
        };
        assert!(stats.to_string().contains("Success rate: 75.0%"));
    }
}
