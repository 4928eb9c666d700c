//! Staged uploads: client bytes spooled to a local temp file before the
//! remote upload runs.
//!
//! The temp file rides a [`tempfile::TempPath`], whose drop removes it. A
//! `StagedUpload` is consumed by value by the asset service, so the file is
//! deleted exactly once on every exit path (success, upload failure, or an
//! error before the upload starts) without per-branch cleanup calls.

use axum::extract::multipart::Field;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use vidora_core::AppError;
use vidora_storage::MediaKind;

/// Size limit and allowlists for one media kind, from configuration.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_file_size: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
}

/// A client upload spooled to local disk, pending remote storage.
#[derive(Debug)]
pub struct StagedUpload {
    path: TempPath,
    pub original_filename: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
    pub kind: MediaKind,
}

impl StagedUpload {
    pub fn new(
        file: NamedTempFile,
        original_filename: String,
        content_type: Option<String>,
        size_bytes: u64,
        kind: MediaKind,
    ) -> Self {
        Self {
            path: file.into_temp_path(),
            original_filename,
            content_type,
            size_bytes,
            kind,
        }
    }

    /// Filesystem path of the spooled bytes.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn validate_field(
    filename: &str,
    content_type: Option<&str>,
    limits: &UploadLimits,
) -> Result<(), AppError> {
    let ext = file_extension(filename).ok_or_else(|| {
        AppError::InvalidInput(format!("Missing file extension (filename: {})", filename))
    })?;

    if !limits.allowed_extensions.contains(&ext) {
        return Err(AppError::InvalidInput(format!(
            "Invalid extension '{}', allowed: {:?}",
            ext, limits.allowed_extensions
        )));
    }

    if let Some(content_type) = content_type {
        let normalized = content_type.to_lowercase();
        if !limits.allowed_content_types.contains(&normalized) {
            return Err(AppError::InvalidInput(format!(
                "Invalid content type '{}', allowed: {:?}",
                content_type, limits.allowed_content_types
            )));
        }
    }

    Ok(())
}

/// Spool one multipart field to a temp file in `spool_dir`, enforcing the
/// given limits. The returned guard owns the file.
pub async fn stage_field(
    mut field: Field<'_>,
    spool_dir: Option<&PathBuf>,
    limits: &UploadLimits,
    kind: MediaKind,
) -> Result<StagedUpload, AppError> {
    let original_filename = field
        .file_name()
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::InvalidInput("Missing filename in upload".to_string()))?;
    let content_type = field.content_type().map(|s| s.to_string());

    validate_field(&original_filename, content_type.as_deref(), limits)?;

    let mut file = match spool_dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new()?,
    };

    let mut size_bytes: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?
    {
        size_bytes += chunk.len() as u64;
        if size_bytes > limits.max_file_size as u64 {
            return Err(AppError::PayloadTooLarge(format!(
                "{} bytes exceeds max {} bytes",
                size_bytes, limits.max_file_size
            )));
        }
        file.write_all(&chunk)?;
    }

    if size_bytes == 0 {
        return Err(AppError::InvalidInput("File is empty".to_string()));
    }
    file.flush()?;

    Ok(StagedUpload::new(
        file,
        original_filename,
        content_type,
        size_bytes,
        kind,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_limits() -> UploadLimits {
        UploadLimits {
            max_file_size: 1024,
            allowed_extensions: vec!["jpg".to_string(), "png".to_string()],
            allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
        }
    }

    #[test]
    fn test_validate_field_accepts_allowed() {
        assert!(validate_field("photo.JPG", Some("image/jpeg"), &image_limits()).is_ok());
    }

    #[test]
    fn test_validate_field_rejects_extension() {
        let err = validate_field("payload.exe", None, &image_limits()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_field_rejects_content_type() {
        let err = validate_field("photo.jpg", Some("text/html"), &image_limits()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_staged_upload_removes_file_on_drop() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"bytes").unwrap();
        let staged = StagedUpload::new(
            file,
            "photo.jpg".to_string(),
            Some("image/jpeg".to_string()),
            5,
            MediaKind::Image,
        );
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }
}
