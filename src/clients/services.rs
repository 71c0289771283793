use axum::http::HeaderMap;
use tracing::{debug, instrument};

use crate::auth::extractors::resolve_session;
use crate::clients::repo::ClientProfile;
use crate::error::AppError;
use crate::state::AppState;

/// Client profile of whoever the request's session belongs to.
///
/// No session and no matching profile are both `Ok(None)`; only a failing
/// profile query is an error.
#[instrument(skip_all)]
pub async fn get_cliente_by_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<ClientProfile>, AppError> {
    let Some((_, user)) = resolve_session(state, headers).await else {
        debug!("no session, no client profile");
        return Ok(None);
    };
    let profile = state.clients.find_by_email(&user.email).await?;
    if profile.is_none() {
        debug!(user_id = %user.id, "user has no client profile");
    }
    Ok(profile)
}
