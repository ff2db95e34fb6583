use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, error};

use super::{
    types::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse},
    GenerationBackend,
};
use crate::{
    config::RelayConfig,
    error::ServiceError,
    model::{GenerationRequest, GenerationResult},
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Thin client for `models/{model}:generateContent`.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .context("building HTTP client for the generation service")?;

        let model = config
            .model
            .trim()
            .trim_start_matches("models/")
            .to_string();

        Ok(Self {
            http,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.api_base.trim_end_matches('/'),
                model
            ),
            model,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, ServiceError> {
        let body = GenerateContentRequest::from(request);

        let mut call = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            call = call.header(API_KEY_HEADER, key);
        }

        debug!(model = %self.model, parts = request.parts().len(), "calling generateContent");
        let response = call.send().await?;
        let status = response.status();
        let raw = response.text().await?;

        if !status.is_success() {
            let err = classify_failure(status, &raw);
            error!(model = %self.model, status = status.as_u16(), body = %raw, "generateContent failed");
            return Err(err);
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&raw).map_err(|e| ServiceError::Malformed(e.to_string()))?;

        match parsed.text() {
            Some(text) => Ok(GenerationResult::new(text)),
            None => Err(ServiceError::EmptyResult(parsed.blocked_reason())),
        }
    }
}

/// Overload and rate limiting are transient; everything else the service
/// refuses is permanent.
pub fn classify_failure(status: StatusCode, raw: &str) -> ServiceError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(raw).ok();
    let service_status = envelope.as_ref().and_then(|e| e.error.status.clone());
    let message = envelope
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    let transient = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
    ) || matches!(
        service_status.as_deref(),
        Some("RESOURCE_EXHAUSTED") | Some("UNAVAILABLE")
    );

    if transient {
        ServiceError::Transient {
            status: status.as_u16(),
            message,
        }
    } else {
        ServiceError::Permanent {
            status: status.as_u16(),
            message,
        }
    }
}
