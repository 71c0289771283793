use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde_json::json;
use tracing::{info, instrument};

use crate::{
    auth::{
        actions::{login_action, logout_action, register_action},
        dto::{
            FormOutcome, LoginForm, PublicUser, RegisterForm, SessionResponse, SignInRequest,
            SignInResponse, SignUpRequest, SignUpResponse,
        },
        extractors::{expired_session_cookie, session_cookie, MaybeSession, SESSION_COOKIE},
        services::SignUpInput,
    },
    error::AppError,
    state::AppState,
};

/// JSON endpoints under `/api/auth`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/sign-up/email", post(sign_up_email))
        .route("/api/auth/sign-in/email", post(sign_in_email))
        .route("/api/auth/sign-out", post(sign_out))
        .route("/api/auth/get-session", get(get_session))
}

/// Form submit handlers.
pub fn form_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-in", post(login_form))
        .route("/sign-up", post(register_form))
        .route("/logout", post(logout_form))
}

fn with_session(state: &AppState, jar: SignedCookieJar, token: String) -> SignedCookieJar {
    jar.add(session_cookie(
        token,
        state.sessions.ttl(),
        state.config.auth.cookie_secure,
    ))
}

fn render(outcome: FormOutcome) -> Response {
    match outcome {
        FormOutcome::Redirect { to } => Redirect::to(&to).into_response(),
        result @ FormOutcome::Result { .. } => Json(result).into_response(),
    }
}

#[instrument(skip(state, payload))]
pub async fn sign_up_email(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<Json<SignUpResponse>, AppError> {
    let Json(payload) = payload?;
    let user = state
        .sessions
        .sign_up(SignUpInput {
            name: payload.name,
            email: payload.email,
            password: payload.password,
        })
        .await?;
    Ok(Json(SignUpResponse { user: user.into() }))
}

#[instrument(skip(state, jar, payload))]
pub async fn sign_in_email(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<(SignedCookieJar, Json<SignInResponse>), AppError> {
    let Json(payload) = payload?;
    let session = state
        .sessions
        .sign_in(&payload.email, &payload.password)
        .await?;
    let user = state
        .sessions
        .user(session.user_id)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    info!(user_id = %user.id, "user signed in");
    let token = session.id.clone();
    let jar = with_session(&state, jar, session.id);
    Ok((
        jar,
        Json(SignInResponse {
            token,
            user: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn sign_out(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Json<serde_json::Value>), AppError> {
    if let Some(token) = jar.get(SESSION_COOKIE) {
        state.sessions.sign_out(token.value()).await?;
    }
    Ok((jar.remove(expired_session_cookie()), Json(json!({ "success": true }))))
}

pub async fn get_session(MaybeSession(found): MaybeSession) -> Json<Option<SessionResponse>> {
    Json(found.map(|(session, user)| SessionResponse {
        session,
        user: user.into(),
    }))
}

#[instrument(skip(state, jar, form))]
pub async fn login_form(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let (outcome, session) = login_action(&state.sessions, form).await;
    match session {
        Some(session) => (with_session(&state, jar, session.id), render(outcome)).into_response(),
        None => render(outcome),
    }
}

#[instrument(skip(state, form))]
pub async fn register_form(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    render(register_action(&state.sessions, form).await)
}

#[instrument(skip(state, jar))]
pub async fn logout_form(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let outcome = logout_action(&state.sessions, token.as_deref()).await;
    (jar.remove(expired_session_cookie()), render(outcome)).into_response()
}
