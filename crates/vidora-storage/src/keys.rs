//! Shared key generation and URL derivation for storage backends.
//!
//! Key format: `media/{uuid}.{ext}`. The key appears verbatim at the end of
//! the asset's public URL, which is what makes [`key_from_url`] possible:
//! the key of an old asset is recovered from the URL stored on the owning
//! record when the asset has to be deleted after replacement.

use crate::traits::{MediaKind, StorageError, StorageResult};
use percent_encoding::percent_decode_str;
use uuid::Uuid;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "mkv", "avi", "m4v"];

/// Generate a fresh storage key, keeping only the original file's extension.
pub fn generate_storage_key(filename: &str) -> StorageResult<String> {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .ok_or_else(|| {
            StorageError::InvalidKey(format!("Missing or invalid extension: {}", filename))
        })?;

    Ok(format!("media/{}.{}", Uuid::new_v4(), ext.to_lowercase()))
}

/// Derive the storage key back from a public URL.
///
/// Works for every backend because they all place the `media/{uuid}.{ext}`
/// key at the end of the URL path. Returns `None` for URLs this service did
/// not produce.
pub fn key_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let idx = path.rfind("/media/")?;
    let key = &path[idx + 1..];
    let decoded = percent_decode_str(key).decode_utf8().ok()?;
    if decoded.contains("..") || decoded.trim_start_matches("media/").is_empty() {
        return None;
    }
    Some(decoded.into_owned())
}

/// Infer the media kind from a reference's shape (its file extension).
pub fn kind_from_url(url: &str) -> MediaKind {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('.').next() {
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()) => MediaKind::Video,
        _ => MediaKind::Image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_storage_key_keeps_extension() {
        let key = generate_storage_key("holiday clip.MP4").unwrap();
        assert!(key.starts_with("media/"));
        assert!(key.ends_with(".mp4"));
    }

    #[test]
    fn test_generate_storage_key_rejects_missing_extension() {
        assert!(generate_storage_key("noext").is_err());
        assert!(generate_storage_key("bad.ext!ension").is_err());
    }

    #[test]
    fn test_key_from_url_s3_style() {
        let url = "https://bucket.s3.us-east-1.amazonaws.com/media/abc.jpg";
        assert_eq!(key_from_url(url), Some("media/abc.jpg".to_string()));
    }

    #[test]
    fn test_key_from_url_custom_endpoint() {
        let url = "http://localhost:9000/bucket/media/abc.webm?X-Amz-Signature=zzz";
        assert_eq!(key_from_url(url), Some("media/abc.webm".to_string()));
    }

    #[test]
    fn test_key_from_url_foreign_url() {
        assert_eq!(key_from_url("https://example.com/other/abc.jpg"), None);
    }

    #[test]
    fn test_kind_from_url() {
        assert_eq!(kind_from_url("https://cdn/media/a.mp4"), MediaKind::Video);
        assert_eq!(kind_from_url("https://cdn/media/a.webm"), MediaKind::Video);
        assert_eq!(kind_from_url("https://cdn/media/a.jpg"), MediaKind::Image);
        assert_eq!(kind_from_url("https://cdn/media/a"), MediaKind::Image);
    }
}
