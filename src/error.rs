//! Error handling and custom error types
//!
//! Provides unified error handling across the try-on workflow using thiserror.
//! The `Display` text of each variant is what ends up in front of the user, so
//! variants that wrap service internals keep them out of the message.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read image file: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    EmptyResponse(String),

    /// The wrapped detail is for diagnostics only and is not part of the
    /// displayed message.
    #[error("Failed to generate the try-on image from the service")]
    Transport(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid download data: {0}")]
    Download(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl Error {
    /// Diagnostic detail for logs; identical to the display text except for
    /// transport failures.
    pub fn detail(&self) -> String {
        match self {
            Error::Transport(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display_hides_service_text() {
        let err = Error::Transport("Gemini API error (status 500): secret stack trace".to_string());
        assert!(!err.to_string().contains("secret"));
        assert!(err.detail().contains("secret stack trace"));
    }

    #[test]
    fn test_validation_displays_message_verbatim() {
        let err = Error::Validation("Please upload both images before trying on.".to_string());
        assert_eq!(err.to_string(), "Please upload both images before trying on.");
    }
}
