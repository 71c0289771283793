use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, instrument};

use crate::{
    auth::{dto::PublicUser, extractors::AuthSession},
    clients::{repo::ClientProfile, services::get_cliente_by_session},
    error::AppError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/cliente-logado", get(cliente_logado))
        .route("/dashboard", get(dashboard))
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: PublicUser,
    pub cliente: Option<ClientProfile>,
}

#[instrument(skip(state, headers))]
pub async fn cliente_logado(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match get_cliente_by_session(&state, &headers).await {
        Ok(cliente) => Json(json!({ "success": true, "cliente": cliente })).into_response(),
        Err(e) => {
            error!(error = %e, "client profile lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Erro interno do servidor" })),
            )
                .into_response()
        }
    }
}

#[instrument(skip(state, auth))]
pub async fn dashboard(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<DashboardResponse>, AppError> {
    let cliente = state.clients.find_by_email(&auth.user.email).await?;
    Ok(Json(DashboardResponse {
        user: auth.user.into(),
        cliente,
    }))
}
