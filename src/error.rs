use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::types::ErrorResponse;

/// Failure of a single call to the generation service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Overloaded or rate limited. Worth another attempt.
    #[error("generation service overloaded or rate limited (HTTP {status}): {message}")]
    Transient { status: u16, message: String },

    /// The service rejected the request itself. Repeating it will not help.
    #[error("generation service rejected the request (HTTP {status}): {message}")]
    Permanent { status: u16, message: String },

    #[error("could not reach the generation service: {0}")]
    Transport(String),

    #[error("generation service returned no usable text{}", .0.as_deref().map(|r| format!(" (finish reason: {r})")).unwrap_or_default())]
    EmptyResult(Option<String>),

    #[error("generation service returned an unreadable response: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// Transport faults count as transient: the same request may well succeed next time.
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Transient { .. } | ServiceError::Transport(_))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

/// Everything `Gateway::analyze` can fail with.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    ClientInput(String),

    #[error("GEMINI_API_KEY is not configured")]
    MissingCredential,

    #[error("generation failed after {attempts} attempt(s): {source}")]
    Upstream {
        attempts: u32,
        #[source]
        source: ServiceError,
    },

    #[error("request body exceeds the configured limit")]
    PayloadTooLarge,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::ClientInput(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::MissingCredential | GatewayError::Upstream { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable kind, safe to hand to callers.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::ClientInput(_) => "invalid_input",
            GatewayError::PayloadTooLarge => "payload_too_large",
            GatewayError::MissingCredential => "credential_missing",
            GatewayError::Upstream { source, .. } => match source {
                ServiceError::Transient { .. } | ServiceError::Transport(_) => {
                    "upstream_unavailable"
                }
                ServiceError::Permanent { .. } => "upstream_rejected",
                ServiceError::EmptyResult(_) => "empty_result",
                ServiceError::Malformed(_) => "upstream_malformed",
            },
        }
    }

    /// Message shown to the caller. Input errors describe the caller's own
    /// request; server-side detail stays in the log.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::ClientInput(msg) => msg.clone(),
            GatewayError::PayloadTooLarge => "Request body is too large".into(),
            GatewayError::MissingCredential => {
                "Server is not configured for document analysis. Check the server logs.".into()
            }
            GatewayError::Upstream { source, .. } => match source {
                ServiceError::Transient { .. } | ServiceError::Transport(_) => {
                    "Document analysis service is busy. Please try again shortly.".into()
                }
                ServiceError::Permanent { .. } => {
                    "Document analysis service rejected the request. Check the server logs.".into()
                }
                ServiceError::EmptyResult(_) => {
                    "Document analysis returned no result for this document.".into()
                }
                ServiceError::Malformed(_) => {
                    "Document analysis service returned an unexpected response.".into()
                }
            },
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.public_message(),
            code: self.code().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
