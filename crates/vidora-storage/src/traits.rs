//! Storage abstraction trait
//!
//! This module defines the MediaStorage trait that all storage backends must
//! implement.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use vidora_core::config::StorageBackend;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Kind of media a remote asset holds. Deletion must address the right
/// resource kind, so it travels with every storage call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// A successfully stored remote asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// Backend-internal identifier (also the final URL path segment).
    pub key: String,
    /// Publicly accessible URL.
    pub url: String,
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait, so
/// the asset services can work with any backend without coupling to
/// implementation details. Test code substitutes recording fakes.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Upload the file at `local_path` and return its key and public URL.
    ///
    /// `filename` supplies the extension for the generated key; the rest of
    /// the name is discarded in favor of a fresh UUID.
    async fn upload_file(
        &self,
        local_path: &Path,
        filename: &str,
        kind: MediaKind,
    ) -> StorageResult<UploadedAsset>;

    /// Delete a previously uploaded asset by its storage key.
    async fn delete(&self, storage_key: &str, kind: MediaKind) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
