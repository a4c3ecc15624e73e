use crate::state::AppState;
use axum::Router;

pub mod context;
pub mod dto;
pub mod handlers;
pub mod services;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::page_routes())
        .merge(handlers::auth_routes())
}
