//! Remote asset synchronization.
//!
//! Replacing an asset must keep local and remote state consistent under
//! partial failure. The ordering invariant throughout: the new asset is
//! confirmed live (uploaded AND referenced by the owning row) before the old
//! one is deleted, never the reverse, which would open a window where
//! neither asset exists.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;
use vidora_core::models::AssetSlot;
use vidora_core::AppError;
use vidora_db::{PrincipalStore, VideoStore};
use vidora_storage::{keys, MediaStorage, UploadedAsset};

use super::staging::StagedUpload;

/// Outcome of an operation whose failure is absorbed, not propagated.
/// Carrying no error payload makes the fatal/best-effort distinction a
/// type-level contract; the failure has already been logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BestEffort {
    Completed,
    Failed,
}

/// Uploads staged files to remote storage and keeps owning records in sync.
#[derive(Clone)]
pub struct AssetService {
    storage: Arc<dyn MediaStorage>,
    users: Arc<dyn PrincipalStore>,
    videos: Arc<dyn VideoStore>,
    remote_timeout: Duration,
}

impl AssetService {
    pub fn new(
        storage: Arc<dyn MediaStorage>,
        users: Arc<dyn PrincipalStore>,
        videos: Arc<dyn VideoStore>,
        remote_timeout: Duration,
    ) -> Self {
        Self {
            storage,
            users,
            videos,
            remote_timeout,
        }
    }

    /// Replace the remote asset in one of a user's slots.
    ///
    /// Returns the new asset's public URL. The previous asset, if any, is
    /// deleted best-effort only after the new reference is persisted; a
    /// failed persist leaves the fresh upload orphaned rather than risking
    /// the only copy with a compensating delete.
    #[tracing::instrument(skip(self, staged), fields(user_id = %user_id, slot = %slot))]
    pub async fn replace_user_asset(
        &self,
        user_id: Uuid,
        slot: AssetSlot,
        staged: Option<StagedUpload>,
    ) -> Result<String, AppError> {
        let staged = staged.ok_or_else(|| {
            AppError::InvalidInput(format!("No {} file provided", slot))
        })?;

        let uploaded = self.upload_staged(staged).await?;

        let user = self
            .users
            .load(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // The only moment the old reference is visible; captured here, never
        // re-derived after the slot is overwritten.
        let previous = match slot {
            AssetSlot::Avatar => user.avatar_url,
            AssetSlot::Cover => user.cover_url,
        };

        if let Err(e) = self.users.set_asset_url(user_id, slot, &uploaded.url).await {
            tracing::warn!(
                error = %e,
                user_id = %user_id,
                slot = %slot,
                orphaned_key = %uploaded.key,
                "Slot update failed after upload; remote asset orphaned"
            );
            return Err(e);
        }

        if let Some(old_url) = previous {
            self.delete_remote(&old_url).await;
        }

        Ok(uploaded.url)
    }

    /// Replace a video's thumbnail. Same sequence and failure policy as
    /// [`Self::replace_user_asset`].
    #[tracing::instrument(skip(self, staged), fields(video_id = %video_id))]
    pub async fn replace_video_thumbnail(
        &self,
        video_id: Uuid,
        staged: Option<StagedUpload>,
    ) -> Result<String, AppError> {
        let staged =
            staged.ok_or_else(|| AppError::InvalidInput("No thumbnail file provided".to_string()))?;

        let uploaded = self.upload_staged(staged).await?;

        let video = self
            .videos
            .load(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        let previous = video.thumbnail_url;

        if let Err(e) = self.videos.set_thumbnail_url(video_id, &uploaded.url).await {
            tracing::warn!(
                error = %e,
                video_id = %video_id,
                orphaned_key = %uploaded.key,
                "Thumbnail update failed after upload; remote asset orphaned"
            );
            return Err(e);
        }

        if let Some(old_url) = previous {
            self.delete_remote(&old_url).await;
        }

        Ok(uploaded.url)
    }

    /// Upload a staged file to remote storage, for records that do not yet
    /// reference anything (fresh video uploads).
    pub async fn store_new_asset(&self, staged: StagedUpload) -> Result<UploadedAsset, AppError> {
        self.upload_staged(staged).await
    }

    /// Best-effort delete of a remote asset by its public URL. The storage
    /// key is derived from the URL and the kind inferred from its shape.
    /// Every failure is logged and swallowed so callers running a larger
    /// deletion are never blocked by the storage side.
    pub async fn delete_remote(&self, url: &str) -> BestEffort {
        let Some(key) = keys::key_from_url(url) else {
            tracing::warn!(url = %url, "Could not derive storage key from URL; skipping delete");
            return BestEffort::Failed;
        };
        let kind = keys::kind_from_url(url);

        match timeout(self.remote_timeout, self.storage.delete(&key, kind)).await {
            Ok(Ok(())) => BestEffort::Completed,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, key = %key, "Failed to delete remote asset");
                BestEffort::Failed
            }
            Err(_) => {
                tracing::warn!(key = %key, timeout = ?self.remote_timeout, "Remote asset delete timed out");
                BestEffort::Failed
            }
        }
    }

    /// Upload the staged bytes, bounded by the remote-op timeout.
    ///
    /// `staged` is consumed by value: its drop guard removes the local spool
    /// file exactly once when this function returns, on the success path and
    /// on every failure path alike.
    async fn upload_staged(&self, staged: StagedUpload) -> Result<UploadedAsset, AppError> {
        let upload = self.storage.upload_file(
            staged.path(),
            &staged.original_filename,
            staged.kind,
        );

        match timeout(self.remote_timeout, upload).await {
            Ok(Ok(asset)) => Ok(asset),
            Ok(Err(e)) => Err(AppError::Storage(e.to_string())),
            Err(_) => Err(AppError::Storage(format!(
                "Upload timed out after {:?}",
                self.remote_timeout
            ))),
        }
    }
}
