use std::sync::Arc;

use tracing::{error, info};

use crate::{
    config::RelayConfig,
    error::{GatewayError, ServiceError},
    external_api::GenerationBackend,
    model::{GenerationRequest, GenerationResult, ImagePart, IncomingImagePart},
    retry::{self, Attempt, RetryPolicy},
};

const NO_IMAGES: &str = "No image data provided";

/// Validates a document, composes the generation request and drives the
/// backend through the retry loop.
pub struct Gateway {
    backend: Arc<dyn GenerationBackend>,
    instruction: String,
    retry: RetryPolicy,
    credential_present: bool,
    model: String,
}

impl Gateway {
    pub fn new(config: &RelayConfig, backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            instruction: config.instruction.clone(),
            retry: config.retry.clone(),
            credential_present: config.has_credential(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn credential_present(&self) -> bool {
        self.credential_present
    }

    /// Turn the raw client list into validated parts. No network involved.
    pub fn validate(parts: Option<Vec<IncomingImagePart>>) -> Result<Vec<ImagePart>, GatewayError> {
        let parts = match parts {
            Some(parts) if !parts.is_empty() => parts,
            _ => return Err(GatewayError::ClientInput(NO_IMAGES.into())),
        };

        parts
            .into_iter()
            .enumerate()
            .map(|(index, part)| ImagePart::from_incoming(index, part))
            .collect::<Result<Vec<_>, _>>()
            .map_err(GatewayError::ClientInput)
    }

    pub async fn analyze(
        &self,
        parts: Option<Vec<IncomingImagePart>>,
    ) -> Result<GenerationResult, GatewayError> {
        let parts = Self::validate(parts)?;

        if !self.credential_present {
            error!("rejecting analyze request: GEMINI_API_KEY is not configured");
            return Err(GatewayError::MissingCredential);
        }

        let request = GenerationRequest::new(self.instruction.as_str(), parts)
            .ok_or_else(|| GatewayError::ClientInput(NO_IMAGES.into()))?;

        info!(images = request.parts().len(), model = %self.model, "processing document");

        let backend = self.backend.as_ref();
        let request = &request;
        let outcome = retry::run(&self.retry, move |_| async move {
            match backend.generate(request).await {
                Ok(result) => Attempt::Done(result),
                Err(err) if err.is_transient() => Attempt::Retry(err),
                Err(err) => Attempt::Fail(err),
            }
        })
        .await;

        match outcome {
            Ok(result) => {
                info!(chars = result.text.len(), "generation succeeded");
                Ok(result)
            }
            Err(err) => {
                let attempts = err.attempts();
                let source: ServiceError = err.into_inner();
                error!(attempts, error = %source, "generation failed");
                Err(GatewayError::Upstream { attempts, source })
            }
        }
    }
}
