//! Upload encoding
//!
//! Turns a user-selected image file into the base64 payload and media type the
//! generation service expects as inline data.

use crate::mime::detect_image_mime;
use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A transport-safe image: standard base64 payload plus its declared media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub payload: String,
    pub media_type: String,
}

impl EncodedImage {
    pub fn new(payload: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            media_type: media_type.into(),
        }
    }

    /// `data:<media type>;base64,<payload>` reference for display.
    pub fn to_data_url(&self) -> String {
        data_url(&self.media_type, &self.payload)
    }
}

pub fn data_url(media_type: &str, payload: &str) -> String {
    format!("data:{};base64,{}", media_type, payload)
}

/// Encode bytes already in memory. `source` only helps media type detection.
pub fn encode_bytes(bytes: &[u8], source: Option<&Path>) -> EncodedImage {
    EncodedImage {
        payload: base64::engine::general_purpose::STANDARD.encode(bytes),
        media_type: detect_image_mime(bytes, source).to_string(),
    }
}

/// Read a file fully and encode it.
pub async fn encode_file(path: &Path) -> Result<EncodedImage> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        tracing::warn!("Failed to read {}: {}", path.display(), e);
        Error::Encoding(format!("{}: {}", path.display(), e))
    })?;

    if bytes.is_empty() {
        return Err(Error::Encoding(format!("{}: file is empty", path.display())));
    }

    let encoded = encode_bytes(&bytes, Some(path));
    tracing::debug!(
        "Encoded {} ({} bytes, {})",
        path.display(),
        bytes.len(),
        encoded.media_type
    );
    Ok(encoded)
}
