use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::{debug, error, instrument};

use crate::{
    check::dto::{CpfCheckRequest, CpfCheckResponse, MissingFieldsResponse},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/check/cpf", post(check_cpf))
}

#[instrument(skip_all)]
pub async fn check_cpf(
    State(state): State<AppState>,
    payload: Result<Json<CpfCheckRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection, "unreadable cpf check body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text() })),
            )
                .into_response();
        }
    };

    let Some(cpf) = request.digits() else {
        return (StatusCode::BAD_REQUEST, Json(MissingFieldsResponse::default())).into_response();
    };

    match state.clients.cpf_exists(&cpf).await {
        Ok(exists) => Json(CpfCheckResponse::new(exists)).into_response(),
        Err(e) => {
            error!(error = %e, "cpf lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Erro ao verificar CPF" })),
            )
                .into_response()
        }
    }
}
