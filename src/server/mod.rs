//! HTTP API server.
//!
//! REST endpoints for analysis, chat and reports, plus an optional web page at `/`.

pub mod api;
mod ui;

use crate::assistant::Assistant;
use axum::{
    routing::{delete, get, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
pub type AppState = Arc<Assistant>;

/// Build the router. With `ui` the web page is served at `/`, otherwise a JSON index.
pub fn router(assistant: AppState, ui: bool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let root: MethodRouter<AppState> = if ui {
        get(ui::index)
    } else {
        get(api::index)
    };

    Router::new()
        .route("/", root)
        .route("/health", get(api::health))
        .route("/api/v1/analyze", post(api::analyze))
        .route("/api/v1/status/{video_id}", get(api::status))
        .route("/api/v1/analysis/{video_id}", get(api::analysis))
        .route("/api/v1/chat", post(api::chat))
        .route("/api/v1/sessions/{session_id}/history", get(api::history))
        .route("/api/v1/chat/history/{session_id}", get(api::history))
        .route("/api/v1/videos", get(api::videos))
        .route("/api/v1/cache", delete(api::clear_cache))
        .route("/api/v1/cache/{video_id}", delete(api::clear_video))
        .route("/api/v1/compare", post(api::compare))
        .route("/api/v1/compare/{id}", get(api::comparison))
        .route("/api/v1/trends", post(api::trends))
        .route("/api/v1/trends/{id}", get(api::trend_report))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(assistant)
}

/// Endpoint listing shown at startup and by the JSON index.
pub const ENDPOINTS: &[(&str, &str)] = &[
    ("Health", "GET    /health"),
    ("Analyze", "POST   /api/v1/analyze"),
    ("Status", "GET    /api/v1/status/{video_id}"),
    ("Analysis", "GET    /api/v1/analysis/{video_id}?summary_type="),
    ("Chat", "POST   /api/v1/chat"),
    ("History", "GET    /api/v1/sessions/{session_id}/history"),
    ("Videos", "GET    /api/v1/videos"),
    ("Clear cache", "DELETE /api/v1/cache[/{video_id}]"),
    ("Compare", "POST   /api/v1/compare, GET /api/v1/compare/{id}"),
    ("Trends", "POST   /api/v1/trends, GET /api/v1/trends/{id}"),
];
