use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Comment on a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Comment {
    pub id: Uuid,
    pub video_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: Uuid,
    pub video_id: Uuid,
    pub author_id: Uuid,
    pub author_handle: String,
    pub body: String,
    pub like_count: i64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment row joined with author handle and like aggregate.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CommentListRow {
    pub id: Uuid,
    pub video_id: Uuid,
    pub author_id: Uuid,
    pub author_handle: String,
    pub body: String,
    pub like_count: i64,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentListRow> for CommentResponse {
    fn from(row: CommentListRow) -> Self {
        Self {
            id: row.id,
            video_id: row.video_id,
            author_id: row.author_id,
            author_handle: row.author_handle,
            body: row.body,
            like_count: row.like_count,
            is_liked: row.is_liked,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
