//! HTTP router construction.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;
use crate::{api, sse};

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Body limit sits above the upload cap so oversized uploads reach our
    // own check and get a proper PayloadTooLarge response.
    let body_limit = state.config.limits.max_upload_bytes * 2;

    Router::new()
        .route("/health", get(api::health))
        .route("/generate", post(api::generate))
        .route("/logs/stream", get(sse::log_stream))
        .route("/api/v1/curriculum/analyze", post(api::analyze_curriculum))
        .route(
            "/api/v1/curriculum/generate-module",
            post(api::generate_module),
        )
        .route(
            "/api/v1/research/process-url",
            post(api::process_research_url),
        )
        .route("/api/v1/research/upload", post(api::upload_research_paper))
        .route("/api/v1/content", get(api::list_content))
        .route("/api/v1/content/{id}", get(api::get_content))
        .route("/api/v1/agents/chat", post(api::chat))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
