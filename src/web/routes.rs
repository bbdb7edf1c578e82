//! Route definitions for the avatar service API

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::AppState;

use super::api;
use super::viewer;

/// Create the main router with all routes
pub fn create_router(app_state: Arc<AppState>, config: &HttpConfig) -> Router {
    let cors = if config.cors_enabled {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        // Built-in debug viewer
        .route("/", get(viewer::index_page))
        // Service API (JSON)
        .route("/api/status", get(api::get_status))
        .route("/api/state", get(api::get_state))
        .route("/api/config", get(api::get_config))
        .route("/api/config", post(api::update_config))
        .route("/api/input", post(api::update_input))
        // Hosted LLM/TTS proxies
        .route("/api/llm", post(api::post_llm))
        .route("/api/tts", post(api::post_tts))
        .route("/api/speak", post(api::post_speak))
        // SSE stream for viewers
        .route("/api/stream", get(api::state_stream))
        // Static files (the 3D browser client)
        .nest_service("/static", ServeDir::new(&config.static_dir))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
