//! Remote try-on generation
//!
//! Defines the service seam the workflow calls and the Gemini implementation
//! that composites a clothing photo onto a person photo.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiTryOnClient;
pub use mock::MockTryOnClient;

use crate::encoder::EncodedImage;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TryOnService: Send + Sync {
    /// Issue one generation request and return the base64 payload of the
    /// composited image.
    async fn generate(&self, person: &EncodedImage, clothing: &EncodedImage) -> Result<String>;
}
