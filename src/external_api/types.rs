//! Wire types for the Gemini `generateContent` endpoint.

use serde::{Deserialize, Serialize};

use crate::model::GenerationRequest;

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(request: &GenerationRequest) -> Self {
        let mut parts = Vec::with_capacity(request.parts().len() + 1);
        parts.push(Part::text(request.instruction()));
        parts.extend(request.parts().iter().map(|image| Part {
            text: None,
            inline_data: Some(InlineBlob {
                mime_type: image.media_type().as_str().to_string(),
                data: image.to_base64(),
            }),
        }));

        Self {
            contents: vec![Content {
                role: Some("user".into()),
                parts,
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        rename = "inlineData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_data: Option<InlineBlob>,
}

impl Part {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineBlob {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback", default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated. `None` if there is none.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Why nothing came back, when the service says so.
    pub fn blocked_reason(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.clone())
            .or_else(|| {
                self.prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.clone())
            })
    }
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(rename = "finishReason", default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason", default)]
    pub block_reason: Option<String>,
}

/// `{ "error": { "message", "status", .. } }`
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImagePart, MediaType};
    use serde_json::json;

    #[test]
    fn request_puts_instruction_before_images() {
        let parts = vec![
            ImagePart::new(MediaType::Png, b"one".to_vec()).unwrap(),
            ImagePart::new(MediaType::Pdf, b"two".to_vec()).unwrap(),
        ];
        let request = GenerationRequest::new("Read this", parts).unwrap();
        let body = serde_json::to_value(GenerateContentRequest::from(&request)).unwrap();

        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        { "text": "Read this" },
                        { "inlineData": { "mimeType": "image/png", "data": "b25l" } },
                        { "inlineData": { "mimeType": "application/pdf", "data": "dHdv" } }
                    ]
                }]
            })
        );
    }

    #[test]
    fn text_joins_parts_of_first_candidate() {
        let raw = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "{\"transactions\"" }, { "text": ":[]}" } ] } },
                { "content": { "parts": [ { "text": "ignored" } ] } }
            ]
        });
        let response: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"transactions\":[]}"));
    }

    #[test]
    fn blocked_prompt_has_no_text_but_a_reason() {
        let raw = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let response: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.text(), None);
        assert_eq!(response.blocked_reason().as_deref(), Some("SAFETY"));
    }
}
