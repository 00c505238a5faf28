//! Router configuration for Results Service

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/show", post(handlers::show))
        .route("/health", get(handlers::health))
        .with_state(state)
}
