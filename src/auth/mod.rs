use crate::state::AppState;
use axum::Router;

pub mod actions;
pub mod dto;
pub mod extractors;
pub mod gate;
pub mod handlers;
pub mod messages;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod validation;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::api_routes())
        .merge(handlers::form_routes())
}
