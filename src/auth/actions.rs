use tracing::{error, warn};

use crate::auth::{
    dto::{FormOutcome, LoginForm, RegisterForm},
    messages,
    repo_types::Session,
    services::{SessionService, SignUpInput},
};
use crate::error::AppError;

pub const AFTER_LOGIN: &str = "/dashboard";
pub const AFTER_LOGOUT: &str = "/";

/// Login form submit. On success the caller must attach the returned session.
pub async fn login_action(
    sessions: &SessionService,
    form: LoginForm,
) -> (FormOutcome, Option<Session>) {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return (FormOutcome::failure(messages::LOGIN_FIELDS_REQUIRED), None);
    }

    match sessions.sign_in(&form.email, &form.password).await {
        Ok(session) => (FormOutcome::redirect(AFTER_LOGIN), Some(session)),
        Err(AppError::InvalidCredentials) => {
            (FormOutcome::failure(messages::INVALID_CREDENTIALS), None)
        }
        Err(e) => {
            error!(error = %e, "login action failed");
            (FormOutcome::failure(messages::SERVER_ERROR), None)
        }
    }
}

pub async fn register_action(sessions: &SessionService, form: RegisterForm) -> FormOutcome {
    if form.name.trim().is_empty() || form.email.trim().is_empty() || form.password.is_empty() {
        return FormOutcome::failure(messages::REGISTER_FIELDS_REQUIRED);
    }

    let input = SignUpInput {
        name: form.name,
        email: form.email,
        password: form.password,
    };
    match sessions.sign_up(input).await {
        Ok(_) => FormOutcome::success(messages::REGISTRATION_SUCCESS),
        Err(AppError::Validation { message, .. }) => FormOutcome::failure(message),
        Err(AppError::DuplicateEmail) => FormOutcome::failure(messages::EMAIL_ALREADY_EXISTS),
        Err(e) => {
            error!(error = %e, "register action failed");
            FormOutcome::failure(messages::SERVER_ERROR)
        }
    }
}

/// Revokes the session if any; always ends in a redirect home.
pub async fn logout_action(sessions: &SessionService, token: Option<&str>) -> FormOutcome {
    if let Some(token) = token {
        if let Err(e) = sessions.sign_out(token).await {
            warn!(error = %e, "failed to delete session on logout");
        }
    }
    FormOutcome::redirect(AFTER_LOGOUT)
}
