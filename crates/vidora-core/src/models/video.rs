use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Video entity as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<f64>,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Video as returned by the API, optionally annotated with caller-specific
/// state and denormalized owner fields.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_handle: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<f64>,
    pub views: i64,
    pub is_published: bool,
    pub like_count: i64,
    /// Whether the calling user liked this video; false for anonymous callers.
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
}

/// Row shape produced by the listing queries: video columns joined with the
/// owner handle and the like aggregate.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VideoListRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_handle: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: Option<f64>,
    pub views: i64,
    pub is_published: bool,
    pub like_count: i64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<VideoListRow> for VideoResponse {
    fn from(row: VideoListRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            owner_handle: row.owner_handle,
            title: row.title,
            description: row.description,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            duration_seconds: row.duration_seconds,
            views: row.views,
            is_published: row.is_published,
            like_count: row.like_count,
            is_liked: row.is_liked,
            created_at: row.created_at,
        }
    }
}

/// Per-channel aggregate counters for the dashboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ChannelStats {
    pub total_videos: i64,
    pub total_views: i64,
    pub total_subscribers: i64,
    pub total_likes: i64,
}
