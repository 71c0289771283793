use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, MySqlPool};

use crate::error::AppError;

/// Customer record from `tbl_pessoa`, owned by the business system.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClientProfile {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    pub cpf: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ClientProfileRow {
    pub id: i64,
    pub nome: Option<String>,
    pub email: Option<String>,
    pub cpf: Option<String>,
}

impl TryFrom<ClientProfileRow> for ClientProfile {
    type Error = AppError;

    fn try_from(row: ClientProfileRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .ok_or_else(|| AppError::Mapping(format!("tbl_pessoa.email missing for id {}", row.id)))?;
        Ok(ClientProfile {
            id: row.id,
            name: row.nome.unwrap_or_default(),
            email,
            cpf: row.cpf,
        })
    }
}

/// Reduces a CPF as typed (`123.456.789-00`) to its digits.
pub fn cpf_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Read-only access to client profiles.
#[async_trait]
pub trait ClientProfileStore: Send + Sync {
    /// Exact-match lookup by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<ClientProfile>, AppError>;
    /// `cpf` is digits only.
    async fn cpf_exists(&self, cpf: &str) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct MySqlClientProfileStore {
    db: MySqlPool,
}

impl MySqlClientProfileStore {
    pub fn new(db: MySqlPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClientProfileStore for MySqlClientProfileStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<ClientProfile>, AppError> {
        let row = sqlx::query_as::<_, ClientProfileRow>(
            r#"
            SELECT id, nome, email, cpf
            FROM tbl_pessoa
            WHERE email = ?
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        row.map(ClientProfile::try_from).transpose()
    }

    async fn cpf_exists(&self, cpf: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM tbl_pessoa
            WHERE REPLACE(REPLACE(REPLACE(cpf, '.', ''), '-', ''), ' ', '') = ?
            "#,
        )
        .bind(cpf)
        .fetch_one(&self.db)
        .await?;
        Ok(count > 0)
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryClientProfileStore {
        rows: Mutex<Vec<ClientProfile>>,
        pub fail: bool,
    }

    impl MemoryClientProfileStore {
        pub fn with(rows: Vec<ClientProfile>) -> Self {
            Self {
                rows: Mutex::new(rows),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                rows: Mutex::default(),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl ClientProfileStore for MemoryClientProfileStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<ClientProfile>, AppError> {
            if self.fail {
                return Err(AppError::Database(sqlx::Error::PoolTimedOut));
            }
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|p| p.email == email).cloned())
        }

        async fn cpf_exists(&self, cpf: &str) -> Result<bool, AppError> {
            if self.fail {
                return Err(AppError::Database(sqlx::Error::PoolTimedOut));
            }
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .any(|p| p.cpf.as_deref().map(cpf_digits).as_deref() == Some(cpf)))
        }
    }
}
