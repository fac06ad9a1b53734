pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/analyze", post(handlers::handle_analyze))
        .route("/api/optimize", post(handlers::handle_optimize))
        .route("/api/download", post(handlers::handle_download))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
