//! Repository and service wiring

use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use vidora_core::Config;
use vidora_db::{
    CommentRepository, LikeRepository, PlaylistRepository, SubscriptionRepository, UserRepository,
    VideoRepository,
};
use vidora_storage::MediaStorage;

use crate::auth::TokenService;
use crate::services::{AssetService, UploadLimits};
use crate::state::{AppState, AuthState, DbState, MediaState};

/// Build AppState from the connected pool and storage backend.
pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn MediaStorage>,
) -> Result<Arc<AppState>> {
    let users = UserRepository::new(pool.clone());
    let videos = VideoRepository::new(pool.clone());

    let tokens = TokenService::new(config, Arc::new(users.clone()));

    let assets = AssetService::new(
        storage.clone(),
        Arc::new(users.clone()),
        Arc::new(videos.clone()),
        Duration::from_secs(config.remote_op_timeout_seconds),
    );

    let state = AppState {
        config: config.clone(),
        db: DbState {
            pool: pool.clone(),
            users,
            videos,
            comments: CommentRepository::new(pool.clone()),
            likes: LikeRepository::new(pool.clone()),
            subscriptions: SubscriptionRepository::new(pool.clone()),
            playlists: PlaylistRepository::new(pool),
        },
        auth: AuthState { tokens },
        media: MediaState {
            storage,
            assets,
            image_limits: UploadLimits {
                max_file_size: config.max_image_size_bytes,
                allowed_extensions: config.image_allowed_extensions.clone(),
                allowed_content_types: config.image_allowed_content_types.clone(),
            },
            video_limits: UploadLimits {
                max_file_size: config.max_video_size_bytes,
                allowed_extensions: config.video_allowed_extensions.clone(),
                allowed_content_types: config.video_allowed_content_types.clone(),
            },
            spool_dir: config.upload_spool_dir.clone().map(Into::into),
        },
    };

    Ok(Arc::new(state))
}
