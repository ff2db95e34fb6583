use super::image_part::ImagePart;

/// Instruction followed by the document pages, in order.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    instruction: String,
    parts: Vec<ImagePart>,
}

impl GenerationRequest {
    /// Returns `None` when there is nothing to analyze.
    pub fn new(instruction: impl Into<String>, parts: Vec<ImagePart>) -> Option<Self> {
        if parts.is_empty() {
            return None;
        }
        Some(Self {
            instruction: instruction.into(),
            parts,
        })
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn parts(&self) -> &[ImagePart] {
        &self.parts
    }
}

/// Raw model output. Never parsed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub text: String,
}

impl GenerationResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
