//! Saving the try-on result under its fixed download name.

use crate::{Error, Result};
use base64::Engine as _;
use std::path::{Path, PathBuf};

pub const DOWNLOAD_FILE_NAME: &str = "clothy-try-on.png";

/// Decode a `data:<media type>;base64,<payload>` reference.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let (header, payload) = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| Error::Download("result is not a data reference".to_string()))?;

    if !header.ends_with(";base64") {
        return Err(Error::Download(format!(
            "unsupported data reference encoding: {}",
            header
        )));
    }

    Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
}

/// Write the result image to `dir`, replacing an earlier download.
pub async fn save_result(dir: &Path, data_url: &str) -> Result<PathBuf> {
    let bytes = decode_data_url(data_url)?;

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(DOWNLOAD_FILE_NAME);
    tokio::fs::write(&path, &bytes).await?;

    tracing::info!("Saved try-on image ({} bytes) to {}", bytes.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_decode_data_url() {
        assert_eq!(
            decode_data_url("data:image/png;base64,Zm9v").unwrap(),
            b"foo".to_vec()
        );
    }

    #[test]
    fn test_decode_rejects_plain_text() {
        let err = decode_data_url("Zm9v").unwrap_err();
        assert!(matches!(err, Error::Download(_)));
    }

    #[test]
    fn test_decode_rejects_non_base64_reference() {
        let err = decode_data_url("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, Error::Download(_)));
    }

    #[test]
    fn test_decode_rejects_invalid_payload() {
        let err = decode_data_url("data:image/png;base64,!!!").unwrap_err();
        assert!(matches!(err, Error::Base64(_)));
    }

    #[tokio::test]
    async fn test_save_result_uses_fixed_name() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("downloads");

        let path = save_result(&out, "data:image/png;base64,Zm9v").await.unwrap();
        assert_eq!(path, out.join(DOWNLOAD_FILE_NAME));
        assert_eq!(std::fs::read(&path).unwrap(), b"foo");

        save_result(&out, "data:image/png;base64,YmFy").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"bar");
    }
}
