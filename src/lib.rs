pub mod api;
pub mod config;
pub mod error;
pub mod external_api;
pub mod gateway;
pub mod model;
pub mod prompts;
pub mod retry;
pub mod telemetry;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;

pub use config::RelayConfig;
pub use error::{GatewayError, ServiceError};
pub use external_api::{GeminiClient, GenerationBackend};
pub use gateway::Gateway;

/// Wire the Gemini backend, gateway and HTTP surface from one config.
pub fn build_app(config: &RelayConfig) -> Result<Router> {
    let backend = Arc::new(GeminiClient::new(config)?);
    let gateway = Arc::new(Gateway::new(config, backend));
    Ok(api::router(api::AppState { gateway }, config.max_body_bytes))
}
