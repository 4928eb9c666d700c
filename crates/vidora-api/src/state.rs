//! Application state and sub-state types.
//!
//! AppState is split into domain sub-states (db, auth, media) so wiring in
//! `setup::services` stays readable and handlers reach only what they need.

use sqlx::PgPool;
use std::sync::Arc;
use vidora_core::Config;
use vidora_db::{
    CommentRepository, LikeRepository, PlaylistRepository, SubscriptionRepository, UserRepository,
    VideoRepository,
};
use vidora_storage::MediaStorage;

use crate::auth::TokenService;
use crate::services::{AssetService, UploadLimits};

/// Database pool and all repositories.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub users: UserRepository,
    pub videos: VideoRepository,
    pub comments: CommentRepository,
    pub likes: LikeRepository,
    pub subscriptions: SubscriptionRepository,
    pub playlists: PlaylistRepository,
}

/// Token issuance and validation.
#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenService,
}

/// Object storage, asset synchronization, and upload limits.
#[derive(Clone)]
pub struct MediaState {
    pub storage: Arc<dyn MediaStorage>,
    pub assets: AssetService,
    pub image_limits: UploadLimits,
    pub video_limits: UploadLimits,
    pub spool_dir: Option<std::path::PathBuf>,
}

pub struct AppState {
    pub config: Config,
    pub db: DbState,
    pub auth: AuthState,
    pub media: MediaState,
}
