use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/walk", post(handlers::complete_walk_form))
        .route("/api/today", get(handlers::get_today))
        .route("/api/walk", post(handlers::complete_walk))
        .route("/api/notifications", get(handlers::get_notifications))
        .with_state(state)
}
