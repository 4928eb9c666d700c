//! Abstract store contracts consumed by the token and asset services.
//!
//! Keeping these as traits lets the services run against in-memory fakes in
//! tests while production wires in the sqlx repositories.

use async_trait::async_trait;
use uuid::Uuid;
use vidora_core::models::{AssetSlot, User, Video};
use vidora_core::AppError;

/// Store operations on the user (principal) aggregate needed by the token
/// and asset services: load-by-id, field updates, and the conditional
/// refresh-token swap.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn load(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Overwrite the stored refresh token unconditionally (issuance).
    /// Errors with `NotFound` when the user row does not exist.
    async fn set_refresh_token(&self, id: Uuid, token: &str) -> Result<(), AppError>;

    /// Replace the stored refresh token only where it currently equals
    /// `expected`. Returns whether a row was updated, i.e. the atomic
    /// compare-and-swap that decides rotation races.
    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        new: &str,
    ) -> Result<bool, AppError>;

    async fn clear_refresh_token(&self, id: Uuid) -> Result<(), AppError>;

    /// Persist a new remote-asset URL on the given slot.
    /// Errors with `NotFound` when the user row does not exist.
    async fn set_asset_url(&self, id: Uuid, slot: AssetSlot, url: &str) -> Result<(), AppError>;
}

/// Store operations on the video aggregate needed by the asset service.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn load(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Persist a new thumbnail URL. Errors with `NotFound` when the video
    /// row does not exist.
    async fn set_thumbnail_url(&self, id: Uuid, url: &str) -> Result<(), AppError>;
}
