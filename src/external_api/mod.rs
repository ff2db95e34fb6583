pub mod gemini;
pub mod types;

use async_trait::async_trait;

use crate::{
    error::ServiceError,
    model::{GenerationRequest, GenerationResult},
};

pub use gemini::GeminiClient;

/// One call to a generation service. Implementations make exactly one
/// outbound request per invocation; retrying is the caller's business.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, ServiceError>;
}
