use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

/// Image part as it arrives from the client, before validation.
///
/// Two shapes are accepted: the flat `{ data, mimeType }` form and the
/// SDK-style `{ inlineData: { data, mimeType } }` form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomingImagePart {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(rename = "mimeType", default)]
    pub mime_type: Option<String>,
    #[serde(rename = "inlineData", default)]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InlineData {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(rename = "mimeType", default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Png,
    Jpeg,
    Webp,
    Heic,
    Heif,
    Pdf,
}

impl MediaType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(MediaType::Png),
            "image/jpeg" | "image/jpg" => Some(MediaType::Jpeg),
            "image/webp" => Some(MediaType::Webp),
            "image/heic" => Some(MediaType::Heic),
            "image/heif" => Some(MediaType::Heif),
            "application/pdf" => Some(MediaType::Pdf),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Webp => "image/webp",
            MediaType::Heic => "image/heic",
            MediaType::Heif => "image/heif",
            MediaType::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated page of a document: decoded bytes plus a recognized media type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePart {
    media_type: MediaType,
    bytes: Vec<u8>,
}

impl fmt::Debug for ImagePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePart")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImagePart {
    pub fn new(media_type: MediaType, bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        Some(Self { media_type, bytes })
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Validate a client-supplied part. `index` is only used in the message.
    pub fn from_incoming(index: usize, incoming: IncomingImagePart) -> Result<Self, String> {
        let (data, declared) = match incoming.inline_data {
            Some(inline) => (
                inline.data.or(incoming.data),
                inline.mime_type.or(incoming.mime_type),
            ),
            None => (incoming.data, incoming.mime_type),
        };

        let data = data
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| format!("imageParts[{index}] is missing data"))?;

        let (payload, url_type) = split_data_url(&data);
        let declared = declared
            .filter(|m| !m.trim().is_empty())
            .or(url_type)
            .ok_or_else(|| format!("imageParts[{index}] is missing mimeType"))?;

        let media_type = MediaType::parse(&declared).ok_or_else(|| {
            format!(
                "imageParts[{index}] has unsupported mimeType '{}'",
                declared.trim()
            )
        })?;

        let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|_| format!("imageParts[{index}] data is not valid base64"))?;

        ImagePart::new(media_type, bytes)
            .ok_or_else(|| format!("imageParts[{index}] data is empty"))
    }
}

/// Split `data:<mime>;base64,<payload>` into payload and mime.
fn split_data_url(raw: &str) -> (&str, Option<String>) {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("data:") else {
        return (trimmed, None);
    };
    match rest.split_once(',') {
        Some((meta, payload)) => {
            let mime = meta
                .split(';')
                .next()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            (payload, mime)
        }
        None => (trimmed, None),
    }
}
