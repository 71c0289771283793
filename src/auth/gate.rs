//! Request gate: keeps anonymous users out of the dashboard and signed-in
//! users out of the sign-in/sign-up pages.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::auth::extractors::resolve_session;
use crate::state::AppState;

pub const PROTECTED_PREFIXES: &[&str] = &["/dashboard"];
pub const AUTH_ENTRY_PREFIXES: &[&str] = &["/sign-in", "/sign-up"];
pub const SIGN_IN_PATH: &str = "/sign-in";
pub const LANDING_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    PassThrough,
    Redirect(&'static str),
}

/// `/dashboard` matches `/dashboard` and `/dashboard/...`, never `/dashboardx`.
fn matches_any(path: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| {
        path.strip_prefix(p)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// True when the decision for `path` depends on the session.
pub fn needs_session(path: &str) -> bool {
    matches_any(path, PROTECTED_PREFIXES) || matches_any(path, AUTH_ENTRY_PREFIXES)
}

pub fn decide(path: &str, authenticated: bool) -> GateDecision {
    if matches_any(path, PROTECTED_PREFIXES) && !authenticated {
        return GateDecision::Redirect(SIGN_IN_PATH);
    }
    if matches_any(path, AUTH_ENTRY_PREFIXES) && authenticated {
        return GateDecision::Redirect(LANDING_PATH);
    }
    GateDecision::PassThrough
}

pub async fn access_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if !needs_session(&path) {
        return next.run(req).await;
    }

    let authenticated = resolve_session(&state, req.headers()).await.is_some();
    match decide(&path, authenticated) {
        GateDecision::PassThrough => next.run(req).await,
        GateDecision::Redirect(to) => {
            debug!(%path, to, authenticated, "gate redirect");
            Redirect::to(to).into_response()
        }
    }
}
