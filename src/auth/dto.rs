use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{Session, User};

/// Request body for `POST /api/auth/sign-up/email`.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for `POST /api/auth/sign-in/email`.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: Session,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            created_at: u.created_at,
        }
    }
}

/// Login form fields; missing fields arrive as empty strings.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// What a form action asks the calling layer to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FormOutcome {
    Redirect { to: String },
    Result { success: bool, message: String },
}

impl FormOutcome {
    pub fn redirect(to: &str) -> Self {
        FormOutcome::Redirect { to: to.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        FormOutcome::Result {
            success: false,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        FormOutcome::Result {
            success: true,
            message: message.into(),
        }
    }
}
