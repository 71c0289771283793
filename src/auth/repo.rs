use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::auth::repo_types::{Session, SessionUserRow, User, UserRow};
use crate::error::{is_unique_violation, AppError};

/// Persistence for users and sessions. Every call is one round-trip;
/// absence is `Ok(None)`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    /// Fails with `DuplicateKey` when the email is taken; the unique index decides.
    async fn create_user(&self, user: &User) -> Result<User, AppError>;
    async fn create_session(&self, session: &Session) -> Result<(), AppError>;
    async fn find_session_with_user(
        &self,
        session_id: &str,
    ) -> Result<Option<(Session, User)>, AppError>;
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MySqlCredentialStore {
    db: MySqlPool,
}

impl MySqlCredentialStore {
    pub fn new(db: MySqlPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for MySqlCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password, name, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password, name, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.db)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn create_user(&self, user: &User) -> Result<User, AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password, name, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.name)
        .bind(user.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateKey(format!("users.email={}", user.email))
            } else {
                AppError::Database(e)
            }
        })?;
        Ok(user.clone())
    }

    async fn create_session(&self, session: &Session) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, expires_at, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(session.user_id.to_string())
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn find_session_with_user(
        &self,
        session_id: &str,
    ) -> Result<Option<(Session, User)>, AppError> {
        let row = sqlx::query_as::<_, SessionUserRow>(
            r#"
            SELECT s.id AS session_id,
                   s.created_at AS session_created_at,
                   s.expires_at,
                   u.id AS user_id,
                   u.email,
                   u.password,
                   u.name,
                   u.created_at AS user_created_at
            FROM sessions s
            JOIN users u ON s.user_id = u.id
            WHERE s.id = ?
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(<(Session, User)>::try_from).transpose()
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// In-memory store with the same uniqueness rules as the schema.
#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryCredentialStore {
        users: Mutex<HashMap<Uuid, User>>,
        sessions: Mutex<HashMap<String, Session>>,
    }

    impl MemoryCredentialStore {
        pub fn user_count(&self) -> usize {
            self.users.lock().unwrap().len()
        }

        pub fn session_count(&self) -> usize {
            self.sessions.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CredentialStore for MemoryCredentialStore {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.email == email).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
            Ok(self.users.lock().unwrap().get(&id).cloned())
        }

        async fn create_user(&self, user: &User) -> Result<User, AppError> {
            let mut users = self.users.lock().unwrap();
            if users.values().any(|u| u.email == user.email) {
                return Err(AppError::DuplicateKey(format!("users.email={}", user.email)));
            }
            users.insert(user.id, user.clone());
            Ok(user.clone())
        }

        async fn create_session(&self, session: &Session) -> Result<(), AppError> {
            if !self.users.lock().unwrap().contains_key(&session.user_id) {
                return Err(AppError::Database(sqlx::Error::Protocol(
                    "foreign key constraint fails".into(),
                )));
            }
            self.sessions
                .lock()
                .unwrap()
                .insert(session.id.clone(), session.clone());
            Ok(())
        }

        async fn find_session_with_user(
            &self,
            session_id: &str,
        ) -> Result<Option<(Session, User)>, AppError> {
            let Some(session) = self.sessions.lock().unwrap().get(session_id).cloned() else {
                return Ok(None);
            };
            let user = self.users.lock().unwrap().get(&session.user_id).cloned();
            Ok(user.map(|u| (session, u)))
        }

        async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
            self.sessions.lock().unwrap().remove(session_id);
            Ok(())
        }
    }
}
