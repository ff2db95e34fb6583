use serde::{Deserialize, Serialize};

use crate::model::IncomingImagePart;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(rename = "imageParts", default)]
    pub image_parts: Option<Vec<IncomingImagePart>>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub result: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub credential_configured: bool,
}
