use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::gateway::Gateway;

pub mod handlers;
pub mod types;

use handlers::{analyze_statement, health, not_found};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// Full HTTP surface: routes, body limit, CORS and request tracing.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/analyze-statement", post(analyze_statement))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        // Browser callers
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
