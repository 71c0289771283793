use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Executor, FromRow, MySqlPool};
use time::OffsetDateTime;

use crate::error::is_unique_violation;

/// Storage the runner applies migrations to.
#[async_trait]
pub trait MigrationBackend: Send + Sync {
    async fn ensure_control_table(&self) -> Result<(), sqlx::Error>;
    async fn is_applied(&self, filename: &str) -> Result<bool, sqlx::Error>;
    /// Applied files and when; empty when the control table does not exist.
    async fn applied(&self) -> Result<HashMap<String, Option<OffsetDateTime>>, sqlx::Error>;
    async fn execute(&self, statement: &str) -> Result<(), sqlx::Error>;
    /// `false` when another runner recorded the file first.
    async fn record_applied(&self, filename: &str) -> Result<bool, sqlx::Error>;
}

#[derive(Debug, FromRow)]
struct MigrationRow {
    filename: String,
    executed_at: Option<OffsetDateTime>,
}

#[derive(Clone)]
pub struct MySqlMigrationBackend {
    db: MySqlPool,
}

impl MySqlMigrationBackend {
    pub fn new(db: MySqlPool) -> Self {
        Self { db }
    }
}

fn is_missing_table(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.code().as_deref() == Some("42S02") || db.message().contains("doesn't exist")
        }
        _ => false,
    }
}

#[async_trait]
impl MigrationBackend for MySqlMigrationBackend {
    async fn ensure_control_table(&self) -> Result<(), sqlx::Error> {
        self.db
            .execute(
                r#"
                CREATE TABLE IF NOT EXISTS _better_auth_migrations (
                    id INT AUTO_INCREMENT PRIMARY KEY,
                    filename VARCHAR(255) NOT NULL UNIQUE,
                    executed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )
                "#,
            )
            .await?;
        Ok(())
    }

    async fn is_applied(&self, filename: &str) -> Result<bool, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM _better_auth_migrations WHERE filename = ?")
                .bind(filename)
                .fetch_one(&self.db)
                .await?;
        Ok(count > 0)
    }

    async fn applied(&self) -> Result<HashMap<String, Option<OffsetDateTime>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, MigrationRow>(
            "SELECT filename, executed_at FROM _better_auth_migrations",
        )
        .fetch_all(&self.db)
        .await;
        match rows {
            Ok(rows) => Ok(rows
                .into_iter()
                .map(|r| (r.filename, r.executed_at))
                .collect()),
            Err(e) if is_missing_table(&e) => Ok(HashMap::new()),
            Err(e) => Err(e),
        }
    }

    async fn execute(&self, statement: &str) -> Result<(), sqlx::Error> {
        // Plain text protocol: DDL is not preparable on every server version.
        self.db.execute(statement).await?;
        Ok(())
    }

    async fn record_applied(&self, filename: &str) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("INSERT INTO _better_auth_migrations (filename) VALUES (?)")
            .bind(filename)
            .execute(&self.db)
            .await;
        match res {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        control_table: bool,
        records: HashMap<String, Option<OffsetDateTime>>,
        tables: HashSet<String>,
        indexes: HashSet<String>,
        executed: Vec<String>,
        fail_on: Option<String>,
        lose_record_race: bool,
    }

    /// Understands just enough SQL to reject a repeated `CREATE TABLE` or
    /// `CREATE INDEX` the way MySQL does.
    #[derive(Default)]
    pub struct MemoryMigrationBackend {
        state: Mutex<State>,
    }

    enum Created {
        Table { name: String, if_not_exists: bool },
        Index(String),
    }

    fn bare(name: &str) -> String {
        name.trim_matches(|c| c == '`' || c == '(').to_string()
    }

    fn created(statement: &str) -> Option<Created> {
        let words: Vec<_> = statement.split_whitespace().take(6).collect();
        let is = |i: usize, kw: &str| words.get(i).is_some_and(|w| w.eq_ignore_ascii_case(kw));
        if !is(0, "create") {
            return None;
        }
        if is(1, "table") {
            if is(2, "if") && is(3, "not") && is(4, "exists") {
                return words.get(5).map(|n| Created::Table {
                    name: bare(n),
                    if_not_exists: true,
                });
            }
            return words.get(2).map(|n| Created::Table {
                name: bare(n),
                if_not_exists: false,
            });
        }
        if is(1, "index") {
            return words.get(2).map(|n| Created::Index(bare(n)));
        }
        None
    }

    impl MemoryMigrationBackend {
        /// Statements containing `needle` fail with a non-recoverable error.
        pub fn fail_on(self, needle: &str) -> Self {
            self.state.lock().unwrap().fail_on = Some(needle.to_string());
            self
        }

        /// Another runner records every file just before this one does.
        pub fn losing_record_race(self) -> Self {
            self.state.lock().unwrap().lose_record_race = true;
            self
        }

        pub fn with_table(self, name: &str) -> Self {
            self.state.lock().unwrap().tables.insert(name.to_string());
            self
        }

        /// Drops the record for `filename`, as if it had never been applied.
        pub fn forget(&self, filename: &str) {
            self.state.lock().unwrap().records.remove(filename);
        }

        pub fn tables(&self) -> Vec<String> {
            let mut names: Vec<_> = self.state.lock().unwrap().tables.iter().cloned().collect();
            names.sort();
            names
        }

        pub fn executed(&self) -> Vec<String> {
            self.state.lock().unwrap().executed.clone()
        }

        pub fn recorded(&self) -> Vec<String> {
            let mut names: Vec<_> = self.state.lock().unwrap().records.keys().cloned().collect();
            names.sort();
            names
        }
    }

    #[async_trait]
    impl MigrationBackend for MemoryMigrationBackend {
        async fn ensure_control_table(&self) -> Result<(), sqlx::Error> {
            self.state.lock().unwrap().control_table = true;
            Ok(())
        }

        async fn is_applied(&self, filename: &str) -> Result<bool, sqlx::Error> {
            Ok(self.state.lock().unwrap().records.contains_key(filename))
        }

        async fn applied(&self) -> Result<HashMap<String, Option<OffsetDateTime>>, sqlx::Error> {
            let state = self.state.lock().unwrap();
            if !state.control_table {
                return Ok(HashMap::new());
            }
            Ok(state.records.clone())
        }

        async fn execute(&self, statement: &str) -> Result<(), sqlx::Error> {
            let mut state = self.state.lock().unwrap();
            if let Some(needle) = &state.fail_on {
                if statement.contains(needle.as_str()) {
                    return Err(sqlx::Error::Protocol(format!(
                        "You have an error in your SQL syntax near '{needle}'"
                    )));
                }
            }
            match created(statement) {
                Some(Created::Table {
                    name,
                    if_not_exists,
                }) => {
                    if !state.tables.insert(name.clone()) && !if_not_exists {
                        return Err(sqlx::Error::Protocol(format!(
                            "Table '{name}' already exists"
                        )));
                    }
                }
                Some(Created::Index(name)) => {
                    if !state.indexes.insert(name.clone()) {
                        return Err(sqlx::Error::Protocol(format!(
                            "Duplicate key name '{name}'"
                        )));
                    }
                }
                None => {}
            }
            state.executed.push(statement.to_string());
            Ok(())
        }

        async fn record_applied(&self, filename: &str) -> Result<bool, sqlx::Error> {
            let mut state = self.state.lock().unwrap();
            let now = Some(OffsetDateTime::now_utc());
            if state.lose_record_race {
                state.records.insert(filename.to_string(), now);
                return Ok(false);
            }
            if state.records.contains_key(filename) {
                return Ok(false);
            }
            state.records.insert(filename.to_string(), now);
            Ok(true)
        }
    }
}
