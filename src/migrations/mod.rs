//! Timestamp-ordered SQL migrations tracked in `_better_auth_migrations`.

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::warn;

pub mod backend;
pub mod runner;

pub use backend::{MigrationBackend, MySqlMigrationBackend};
pub use runner::{MigrationReport, MigrationRunner, MigrationStatus};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{filename}: statement failed ({statement}): {source}")]
    Statement {
        filename: String,
        statement: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

lazy_static! {
    // 2025-09-19T12-04-03.334Z, 20250919120403, or any leading digit run.
    static ref PREFIX_RE: Regex =
        Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}(?:\.\d+)?Z|\d+)").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub filename: String,
    pub path: PathBuf,
    sort_key: String,
}

impl MigrationFile {
    /// `None` unless the name is `<timestamp prefix>...sql`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let filename = path.file_name()?.to_str()?.to_string();
        if !filename.ends_with(".sql") {
            return None;
        }
        let prefix = PREFIX_RE.find(&filename)?.as_str();
        let sort_key = prefix.chars().filter(char::is_ascii_digit).collect();
        Some(Self {
            path: path.to_path_buf(),
            filename,
            sort_key,
        })
    }
}

/// Migration files in `dir`, oldest first.
pub async fn discover(dir: &Path) -> Result<Vec<MigrationFile>, MigrationError> {
    let io_err = |source| MigrationError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        if !entry.file_type().await.map_err(io_err)?.is_file() {
            continue;
        }
        match MigrationFile::from_path(&path) {
            Some(file) => files.push(file),
            None => warn!(path = %path.display(), "ignoring file without timestamp prefix"),
        }
    }
    files.sort_by(|a, b| {
        a.sort_key
            .cmp(&b.sort_key)
            .then_with(|| a.filename.cmp(&b.filename))
    });
    Ok(files)
}

/// Splits a script on `;`, dropping blank and comment-only statements.
pub fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| {
            stmt.lines()
                .map(str::trim)
                .any(|line| !line.is_empty() && !line.starts_with("--"))
        })
        .map(str::to_string)
        .collect()
}

/// Errors that mean the statement's effect is already in place.
pub fn is_recoverable(message: &str) -> bool {
    ["already exists", "Duplicate key name", "Duplicate column name"]
        .iter()
        .any(|needle| message.contains(needle))
}
