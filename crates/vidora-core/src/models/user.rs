use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// User entity as stored in the database.
///
/// `password_hash` and `refresh_token` never leave the server; use
/// [`UserResponse`] for anything client-facing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub handle: String,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    /// Currently valid refresh token; NULL when signed out. When non-null it
    /// equals exactly the most recently issued token.
    pub refresh_token: Option<String>,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Named attachment point for one remote asset on a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSlot {
    Avatar,
    Cover,
}

impl AssetSlot {
    /// Column name backing this slot.
    pub fn column(&self) -> &'static str {
        match self {
            AssetSlot::Avatar => "avatar_url",
            AssetSlot::Cover => "cover_url",
        }
    }
}

impl std::fmt::Display for AssetSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetSlot::Avatar => write!(f, "avatar"),
            AssetSlot::Cover => write!(f, "cover"),
        }
    }
}

/// Public user information (without credentials)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub handle: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            handle: user.handle,
            email: user.email,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            cover_url: user.cover_url,
            created_at: user.created_at,
        }
    }
}

/// Channel profile with subscription counters, as returned by
/// `GET /channels/{handle}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChannelProfile {
    pub id: Uuid,
    pub handle: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub subscriber_count: i64,
    pub subscribed_to_count: i64,
    /// Whether the calling user subscribes to this channel; false for
    /// anonymous callers.
    pub is_subscribed: bool,
}

/// Access/refresh token pair returned on login and rotation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}
