use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{field, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::{
    api::types::{AnalyzeRequest, AnalyzeResponse, ErrorResponse, HealthResponse},
    api::AppState,
    error::GatewayError,
};

pub async fn analyze_statement(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, GatewayError> {
    let request_id = Uuid::new_v4();

    async move {
        let Json(req) = payload.map_err(rejection_to_error)?;
        Span::current().record("images", req.image_parts.as_ref().map_or(0, Vec::len));

        let result = state.gateway.analyze(req.image_parts).await.map_err(|err| {
            if let GatewayError::ClientInput(msg) = &err {
                warn!(%msg, "rejected analyze request");
            }
            err
        })?;

        Ok::<_, GatewayError>(Json(AnalyzeResponse {
            result: result.text,
        }))
    }
    .instrument(info_span!("analyze_statement", %request_id, images = field::Empty))
    .await
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let configured = state.gateway.credential_present();
    Json(HealthResponse {
        status: if configured { "ok" } else { "degraded" },
        model: state.gateway.model().to_string(),
        credential_configured: configured,
    })
}

pub async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".into(),
            code: "not_found".into(),
        }),
    )
}

fn rejection_to_error(rejection: JsonRejection) -> GatewayError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!("request body over limit");
        return GatewayError::PayloadTooLarge;
    }
    warn!(reason = %rejection.body_text(), "unreadable analyze request");
    GatewayError::ClientInput(format!("Invalid request body: {}", rejection.body_text()))
}
