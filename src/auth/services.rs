use std::sync::Arc;

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::{
    password::{burn_verification, hash_password, verify_password},
    repo::CredentialStore,
    repo_types::{Session, User},
    validation::{normalize_email, validate_email, validate_name, validate_password},
};
use crate::error::AppError;

/// Length of the opaque session token.
pub const SESSION_TOKEN_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Issues, validates and revokes sessions on top of a [`CredentialStore`].
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn CredentialStore>,
    ttl: Duration,
}

pub fn generate_session_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

impl SessionService {
    pub fn new(store: Arc<dyn CredentialStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.store.find_user_by_id(id).await
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::InvalidCredentials);
        }

        let user = match self.store.find_user_by_email(&email).await? {
            Some(u) => u,
            None => {
                burn_verification(password);
                warn!(email = %email, "sign-in unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !verify_password(password, &user.password)? {
            warn!(email = %email, user_id = %user.id, "sign-in invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let now = OffsetDateTime::now_utc();
        let expires_at = now
            .checked_add(self.ttl)
            .ok_or(AppError::ExpiryOutOfRange)?;
        let session = Session {
            id: generate_session_token(),
            user_id: user.id,
            created_at: now,
            expires_at,
        };
        self.store.create_session(&session).await?;
        info!(user_id = %user.id, "session issued");
        Ok(session)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn sign_up(&self, input: SignUpInput) -> Result<User, AppError> {
        let email = normalize_email(&input.email);
        let name = input.name.trim().to_string();
        validate_name(&name)?;
        validate_email(&email)?;
        validate_password(&input.password)?;

        // Advisory only: the unique index on users.email settles concurrent sign-ups.
        if self.store.find_user_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::DuplicateEmail);
        }

        let user = User {
            id: Uuid::new_v4(),
            email,
            password: hash_password(&input.password)?,
            name,
            created_at: OffsetDateTime::now_utc(),
        };
        let user = self.store.create_user(&user).await.map_err(|e| match e {
            AppError::DuplicateKey(_) => AppError::DuplicateEmail,
            other => other,
        })?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Resolves a token to its live session. Never fails: misses, expiry and
    /// store errors all read as "not authenticated".
    pub async fn validate_session(&self, token: &str) -> Option<(Session, User)> {
        if token.is_empty() {
            return None;
        }
        match self.store.find_session_with_user(token).await {
            Ok(Some((session, user))) => {
                if session.is_expired(OffsetDateTime::now_utc()) {
                    debug!(user_id = %user.id, "session expired");
                    None
                } else {
                    Some((session, user))
                }
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "session lookup failed");
                None
            }
        }
    }

    #[instrument(skip(self, token))]
    pub async fn sign_out(&self, token: &str) -> Result<(), AppError> {
        self.store.delete_session(token).await?;
        debug!("session deleted");
        Ok(())
    }
}
