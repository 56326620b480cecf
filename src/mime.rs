use std::path::Path;

const FALLBACK_MEDIA_TYPE: &str = "image/png";

/// Sniff the media type from the leading magic bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [_, _, _, _, b'f', b't', b'y', b'p', brand @ ..] if brand.len() >= 4 => {
            match &brand[..4] {
                b"heic" | b"heix" | b"heim" | b"heis" => Some("image/heic"),
                b"mif1" | b"msf1" => Some("image/heif"),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Guess the media type from a file extension.
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

/// Resolve the media type of an upload: content first, then the file name.
pub fn detect_image_mime(bytes: &[u8], path: Option<&Path>) -> &'static str {
    if let Some(mime) = sniff_image_mime(bytes) {
        return mime;
    }
    if let Some(mime) = path.and_then(mime_from_extension) {
        tracing::debug!("Media type taken from file extension: {}", mime);
        return mime;
    }
    tracing::warn!(
        "Unrecognized image format (first 4 bytes: {:02X?}), falling back to {}",
        &bytes[..bytes.len().min(4)],
        FALLBACK_MEDIA_TYPE
    );
    FALLBACK_MEDIA_TYPE
}
