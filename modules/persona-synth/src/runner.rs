//! One end-to-end run: acquire → snapshot → generate → report, recorded in
//! the execution log whether it succeeds or not.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use persona_common::{Config, PersonaError};
use tracing::{error, info};

use crate::pipeline::{GeneratedPersona, PersonaGenerator};
use crate::recovery::RecoveryOutcome;
use crate::report::format_persona;
use crate::run_log::{ActiveRun, ExecutionLog, ExecutionRecord, ExecutionStats};
use crate::snapshot::save_snapshot;
use crate::traits::ItemSource;

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub record: ExecutionRecord,
    pub persona_path: PathBuf,
    pub snapshot_path: Option<PathBuf>,
    pub recovery: RecoveryOutcome,
    /// Statistics over every run so far, this one included.
    pub stats: ExecutionStats,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Execution Summary:")?;
        writeln!(f, "  Username: {}", self.record.username)?;
        writeln!(f, "  Duration: {:.2} seconds", self.record.duration)?;
        writeln!(f, "  Posts scraped: {}", self.record.posts_scraped)?;
        writeln!(f, "  Comments scraped: {}", self.record.comments_scraped)?;
        writeln!(f, "  Total content analyzed: {}", self.record.total_content)?;
        writeln!(f, "  Model used: {}", self.record.model_used)?;
        writeln!(f, "  Persona: {}", self.persona_path.display())?;
        if let Some(path) = &self.snapshot_path {
            writeln!(f, "  Scraped data: {}", path.display())?;
        }
        writeln!(f)?;
        writeln!(f, "Overall Statistics:")?;
        writeln!(f, "  Total executions: {}", self.stats.total_executions)?;
        write!(f, "  Success rate: {:.1}%", self.stats.success_rate)
    }
}

struct Produced {
    generated: GeneratedPersona,
    persona_path: PathBuf,
    snapshot_path: Option<PathBuf>,
}

pub struct PersonaRunner {
    config: Config,
    source: Arc<dyn ItemSource>,
    generator: PersonaGenerator,
    log: ExecutionLog,
}

impl PersonaRunner {
    pub fn new(config: Config, source: Arc<dyn ItemSource>, generator: PersonaGenerator) -> Self {
        let log = ExecutionLog::new(config.execution_log_path());
        Self {
            config,
            source,
            generator,
            log,
        }
    }

    pub fn execution_log(&self) -> &ExecutionLog {
        &self.log
    }

    pub async fn run(&self, username: &str) -> Result<RunSummary> {
        self.config.ensure_dirs()?;
        let mut run = self.log.begin(username, self.generator.model_name());

        match self.execute(username, &mut run).await {
            Ok(produced) => {
                let record = self.log.finish(run, Ok(()))?;
                Ok(RunSummary {
                    record,
                    persona_path: produced.persona_path,
                    snapshot_path: produced.snapshot_path,
                    recovery: produced.generated.recovery,
                    stats: self.log.stats(),
                })
            }
            Err(e) => {
                error!(username, error = %e, "Persona generation failed");
                self.log
                    .finish(run, Err(e.to_string()))
                    .context("recording failed run")?;
                Err(e.into())
            }
        }
    }

    async fn execute(&self, username: &str, run: &mut ActiveRun) -> Result<Produced, PersonaError> {
        let acquired = self.source.acquire(username).await?;
        run.record_scrape(
            acquired.stats.posts,
            acquired.stats.comments,
            acquired.items.len() as u32,
        );

        if acquired.items.is_empty() {
            return Err(PersonaError::EmptyCorpus(username.to_string()));
        }

        let snapshot_path = if self.source.persists_snapshot() {
            let path = self.config.snapshot_path(username);
            save_snapshot(&path, &acquired.items)?;
            Some(path)
        } else {
            None
        };

        let generated = self.generator.generate(username, &acquired.items).await?;

        let report = format_persona(&generated.persona, username, run.execution_time());
        let persona_path = self.config.persona_path(username);
        std::fs::write(&persona_path, report)?;
        info!(username, path = %persona_path.display(), "Persona saved");

        Ok(Produced {
            generated,
            persona_path,
            snapshot_path,
        })
    }
}
