pub mod generation;
pub mod image_part;

pub use generation::{GenerationRequest, GenerationResult};
pub use image_part::{ImagePart, IncomingImagePart, InlineData, MediaType};
