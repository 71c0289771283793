use std::path::PathBuf;
use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use super::{discover, is_recoverable, split_statements, MigrationBackend, MigrationError};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    pub recovered_statements: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    Applied(Option<OffsetDateTime>),
    Pending,
}

pub struct MigrationRunner {
    backend: Arc<dyn MigrationBackend>,
    dir: PathBuf,
}

fn preview(statement: &str) -> String {
    let flat = statement.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(60) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}

impl MigrationRunner {
    pub fn new(backend: Arc<dyn MigrationBackend>, dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            dir: dir.into(),
        }
    }

    /// Applies every pending file in order; stops at the first fatal statement.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub async fn run(&self) -> Result<MigrationReport, MigrationError> {
        self.backend.ensure_control_table().await?;
        let files = discover(&self.dir).await?;
        let mut report = MigrationReport::default();

        for file in files {
            if self.backend.is_applied(&file.filename).await? {
                debug!(file = %file.filename, "already applied");
                report.skipped.push(file.filename);
                continue;
            }

            let sql = tokio::fs::read_to_string(&file.path)
                .await
                .map_err(|source| MigrationError::Io {
                    path: file.path.clone(),
                    source,
                })?;

            for statement in split_statements(&sql) {
                match self.backend.execute(&statement).await {
                    Ok(()) => debug!(file = %file.filename, statement = %preview(&statement), "executed"),
                    Err(e) if is_recoverable(&e.to_string()) => {
                        warn!(
                            file = %file.filename,
                            statement = %preview(&statement),
                            error = %e,
                            "already in place, continuing"
                        );
                        report.recovered_statements += 1;
                    }
                    Err(source) => {
                        return Err(MigrationError::Statement {
                            filename: file.filename,
                            statement: preview(&statement),
                            source,
                        })
                    }
                }
            }

            if self.backend.record_applied(&file.filename).await? {
                info!(file = %file.filename, "applied");
                report.applied.push(file.filename);
            } else {
                warn!(file = %file.filename, "recorded by a concurrent runner");
                report.skipped.push(file.filename);
            }
        }

        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            recovered = report.recovered_statements,
            "migrations finished"
        );
        Ok(report)
    }

    /// Applied/pending per file; executes nothing.
    pub async fn status(&self) -> Result<Vec<(String, MigrationStatus)>, MigrationError> {
        let files = discover(&self.dir).await?;
        let mut applied = self.backend.applied().await?;
        Ok(files
            .into_iter()
            .map(|file| {
                let status = match applied.remove(&file.filename) {
                    Some(at) => MigrationStatus::Applied(at),
                    None => MigrationStatus::Pending,
                };
                (file.filename, status)
            })
            .collect())
    }
}
