use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("email already registered")]
    DuplicateEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("row mapping failed: {0}")]
    Mapping(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("session expiry out of range")]
    ExpiryOutOfRange,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::DuplicateEmail | AppError::DuplicateKey(_) => StatusCode::CONFLICT,
            AppError::Mapping(_)
            | AppError::Hash(_)
            | AppError::ExpiryOutOfRange
            | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation("body", rejection.body_text())
    }
}

/// True when a sqlx error is the store rejecting a duplicate unique key.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation { field, message } => {
                json!({ "success": false, "error": message, "field": field })
            }
            AppError::InvalidCredentials => {
                json!({ "success": false, "error": crate::auth::messages::INVALID_CREDENTIALS })
            }
            AppError::DuplicateEmail | AppError::DuplicateKey(_) => {
                json!({ "success": false, "error": crate::auth::messages::EMAIL_ALREADY_EXISTS })
            }
            AppError::Mapping(_)
            | AppError::Hash(_)
            | AppError::ExpiryOutOfRange
            | AppError::Database(_) => {
                error!(error = %self, "request failed");
                json!({ "success": false, "error": crate::auth::messages::SERVER_ERROR })
            }
        };
        (status, Json(body)).into_response()
    }
}
