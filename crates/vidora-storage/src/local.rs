use crate::keys::generate_storage_key;
use crate::traits::{MediaKind, MediaStorage, StorageError, StorageResult, UploadedAsset};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalMediaStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalMediaStorage {
    /// Create a new LocalMediaStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/vidora/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8080/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalMediaStorage {
            base_path,
            base_url,
        })
    }

    /// Convert storage key to filesystem path with path traversal validation.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(storage_key))
    }

    /// Generate public URL for file
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn upload_file(
        &self,
        local_path: &Path,
        filename: &str,
        kind: MediaKind,
    ) -> StorageResult<UploadedAsset> {
        let key = generate_storage_key(filename)?;
        let dest = self.key_to_path(&key)?;

        self.ensure_parent_dir(&dest).await?;

        let size = fs::copy(local_path, &dest).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                local_path.display(),
                dest.display(),
                e
            ))
        })?;

        let url = self.generate_url(&key);

        tracing::info!(
            key = %key,
            kind = %kind,
            size_bytes = size,
            "Local upload successful"
        );

        Ok(UploadedAsset { key, url })
    }

    async fn delete(&self, storage_key: &str, kind: MediaKind) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(key = %storage_key, kind = %kind, "Local delete successful");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_upload_and_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(
            dir.path().join("store"),
            "http://localhost:8080/files".to_string(),
        )
        .await
        .unwrap();

        let mut staged = tempfile::NamedTempFile::new().unwrap();
        staged.write_all(b"fake image bytes").unwrap();

        let asset = storage
            .upload_file(staged.path(), "photo.jpg", MediaKind::Image)
            .await
            .unwrap();
        assert!(asset.key.starts_with("media/"));
        assert!(asset.url.ends_with(&asset.key));
        assert!(dir.path().join("store").join(&asset.key).exists());

        storage.delete(&asset.key, MediaKind::Image).await.unwrap();
        assert!(!dir.path().join("store").join(&asset.key).exists());
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(
            dir.path().join("store"),
            "http://localhost:8080/files".to_string(),
        )
        .await
        .unwrap();

        let err = storage
            .delete("media/missing.jpg", MediaKind::Image)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(
            dir.path().join("store"),
            "http://localhost:8080/files".to_string(),
        )
        .await
        .unwrap();

        let err = storage
            .delete("../etc/passwd", MediaKind::Image)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
