//! Shared test fixtures: in-memory stores and a recording storage fake.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;
use vidora_api::services::staging::StagedUpload;
use vidora_core::config::StorageBackend;
use vidora_core::models::{AssetSlot, User, Video};
use vidora_core::AppError;
use vidora_db::{PrincipalStore, VideoStore};
use vidora_storage::{MediaKind, MediaStorage, StorageError, StorageResult, UploadedAsset};

fn write_failure() -> AppError {
    AppError::Database(sqlx::Error::PoolClosed)
}

/// In-memory `PrincipalStore`. Writes go through one mutex, so the
/// compare-and-swap is atomic exactly like the SQL conditional update.
#[derive(Default)]
pub struct MemoryPrincipalStore {
    users: Mutex<HashMap<Uuid, User>>,
    /// When set, every write fails as if the database were down.
    pub fail_writes: AtomicBool,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, handle: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            handle: handle.to_string(),
            email: format!("{}@example.com", handle),
            display_name: handle.to_string(),
            password_hash: "unused".to_string(),
            refresh_token: None,
            avatar_url: None,
            cover_url: None,
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().insert(user.id, user.clone());
        user
    }

    pub fn set_slot(&self, id: Uuid, slot: AssetSlot, url: &str) {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).unwrap();
        match slot {
            AssetSlot::Avatar => user.avatar_url = Some(url.to_string()),
            AssetSlot::Cover => user.cover_url = Some(url.to_string()),
        }
    }

    pub fn slot(&self, id: Uuid, slot: AssetSlot) -> Option<String> {
        let users = self.users.lock().unwrap();
        let user = users.get(&id).unwrap();
        match slot {
            AssetSlot::Avatar => user.avatar_url.clone(),
            AssetSlot::Cover => user.cover_url.clone(),
        }
    }

    pub fn stored_refresh_token(&self, id: Uuid) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .and_then(|u| u.refresh_token.clone())
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn load(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn set_refresh_token(&self, id: Uuid, token: &str) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.refresh_token = Some(token.to_string());
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        new: &str,
    ) -> Result<bool, AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if user.refresh_token.as_deref() == Some(expected) {
            user.refresh_token = Some(new.to_string());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn clear_refresh_token(&self, id: Uuid) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.refresh_token = None;
        }
        Ok(())
    }

    async fn set_asset_url(&self, id: Uuid, slot: AssetSlot, url: &str) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        match slot {
            AssetSlot::Avatar => user.avatar_url = Some(url.to_string()),
            AssetSlot::Cover => user.cover_url = Some(url.to_string()),
        }
        Ok(())
    }
}

/// In-memory `VideoStore`.
#[derive(Default)]
pub struct MemoryVideoStore {
    videos: Mutex<HashMap<Uuid, Video>>,
    pub fail_writes: AtomicBool,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_video(&self, owner_id: Uuid, thumbnail_url: Option<&str>) -> Video {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            owner_id,
            title: "test video".to_string(),
            description: String::new(),
            video_url: "https://cdn.test/media/clip.mp4".to_string(),
            thumbnail_url: thumbnail_url.map(String::from),
            duration_seconds: None,
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        };
        self.videos.lock().unwrap().insert(video.id, video.clone());
        video
    }

    pub fn thumbnail(&self, id: Uuid) -> Option<String> {
        self.videos
            .lock()
            .unwrap()
            .get(&id)
            .and_then(|v| v.thumbnail_url.clone())
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn load(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.videos.lock().unwrap().get(&id).cloned())
    }

    async fn set_thumbnail_url(&self, id: Uuid, url: &str) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        let mut videos = self.videos.lock().unwrap();
        let video = videos
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
        video.thumbnail_url = Some(url.to_string());
        Ok(())
    }
}

/// Recording storage fake: remembers every upload and delete, can be told to
/// fail uploads or stall long enough to trip the remote-op timeout.
#[derive(Default)]
pub struct RecordingStorage {
    pub uploads: Mutex<Vec<UploadedAsset>>,
    pub deletes: Mutex<Vec<(String, MediaKind)>>,
    pub fail_uploads: AtomicBool,
    pub stall: AtomicBool,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deletes
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[async_trait]
impl MediaStorage for RecordingStorage {
    async fn upload_file(
        &self,
        local_path: &Path,
        filename: &str,
        _kind: MediaKind,
    ) -> StorageResult<UploadedAsset> {
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("injected failure".to_string()));
        }
        // The staged file must still exist while the upload runs.
        assert!(local_path.exists(), "staged file missing during upload");

        let ext = filename.rsplit('.').next().unwrap_or("bin");
        let key = format!("media/{}.{}", Uuid::new_v4(), ext);
        let asset = UploadedAsset {
            url: format!("https://cdn.test/{}", key),
            key,
        };
        self.uploads.lock().unwrap().push(asset.clone());
        Ok(asset)
    }

    async fn delete(&self, storage_key: &str, kind: MediaKind) -> StorageResult<()> {
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.deletes
            .lock()
            .unwrap()
            .push((storage_key.to_string(), kind));
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Write bytes to a temp file and wrap them as a staged upload.
pub fn staged_upload(filename: &str, kind: MediaKind) -> StagedUpload {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"test bytes").unwrap();
    StagedUpload::new(file, filename.to_string(), None, 10, kind)
}
