use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vidora_core::models::{ChannelStats, PageQuery, Video, VideoListRow};
use vidora_core::AppError;

use super::traits::VideoStore;

const VIDEO_COLUMNS: &str = "id, owner_id, title, description, video_url, thumbnail_url, \
                             duration_seconds, views, is_published, created_at, updated_at";

/// Select list producing [`VideoListRow`]: video columns joined with the
/// owner handle and like aggregates, annotated for the viewer (`$1`).
const LIST_SELECT: &str = r#"
    SELECT v.id, v.owner_id, u.handle AS owner_handle, v.title, v.description,
           v.video_url, v.thumbnail_url, v.duration_seconds, v.views,
           v.is_published, v.created_at,
           (SELECT count(*) FROM likes l WHERE l.video_id = v.id) AS like_count,
           EXISTS(SELECT 1 FROM likes l
                  WHERE l.video_id = v.id AND l.user_id = $1) AS is_liked
    FROM videos v
    JOIN users u ON u.id = v.owner_id
"#;

/// Filters accepted by the listing query.
#[derive(Debug, Default, Clone)]
pub struct VideoFilter {
    /// Only videos owned by this handle.
    pub owner_handle: Option<String>,
    /// Case-insensitive substring match on title and description.
    pub search: Option<String>,
}

/// Repository for managing videos
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new video record
    #[tracing::instrument(skip(self, description), fields(db.table = "videos", db.operation = "insert"))]
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        owner_id: Uuid,
        title: &str,
        description: &str,
        video_url: &str,
        thumbnail_url: Option<&str>,
        duration_seconds: Option<f64>,
        is_published: bool,
    ) -> Result<Video, AppError> {
        let video = sqlx::query_as::<Postgres, Video>(&format!(
            r#"
            INSERT INTO videos (owner_id, title, description, video_url, thumbnail_url,
                                duration_seconds, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VIDEO_COLUMNS}
            "#,
        ))
        .bind(owner_id)
        .bind(title)
        .bind(description)
        .bind(video_url)
        .bind(thumbnail_url)
        .bind(duration_seconds)
        .bind(is_published)
        .fetch_one(&self.pool)
        .await?;

        Ok(video)
    }

    /// Get a bare video row by ID
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<Postgres, Video>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    /// Get an annotated video row for the given viewer
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    pub async fn get_annotated(
        &self,
        id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Option<VideoListRow>, AppError> {
        let row = sqlx::query_as::<Postgres, VideoListRow>(&format!(
            "{LIST_SELECT} WHERE v.id = $2"
        ))
        .bind(viewer)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// List published videos with optional owner/search filters.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn list(
        &self,
        filter: &VideoFilter,
        viewer: Option<Uuid>,
        page: &PageQuery,
    ) -> Result<(Vec<VideoListRow>, i64), AppError> {
        let (limit, offset) = page.bounds();
        let search_pattern = filter.search.as_ref().map(|s| format!("%{}%", s));

        let rows = sqlx::query_as::<Postgres, VideoListRow>(&format!(
            r#"
            {LIST_SELECT}
            WHERE v.is_published = TRUE
              AND ($2::text IS NULL OR lower(u.handle) = lower($2))
              AND ($3::text IS NULL OR v.title ILIKE $3 OR v.description ILIKE $3)
            ORDER BY v.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        ))
        .bind(viewer)
        .bind(filter.owner_handle.as_deref())
        .bind(search_pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT count(*)
            FROM videos v
            JOIN users u ON u.id = v.owner_id
            WHERE v.is_published = TRUE
              AND ($1::text IS NULL OR lower(u.handle) = lower($1))
              AND ($2::text IS NULL OR v.title ILIKE $2 OR v.description ILIKE $2)
            "#,
        )
        .bind(filter.owner_handle.as_deref())
        .bind(search_pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Owner's videos including unpublished ones, for the dashboard.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn list_for_owner(
        &self,
        owner_id: Uuid,
        page: &PageQuery,
    ) -> Result<(Vec<VideoListRow>, i64), AppError> {
        let (limit, offset) = page.bounds();

        let rows = sqlx::query_as::<Postgres, VideoListRow>(&format!(
            r#"
            {LIST_SELECT}
            WHERE v.owner_id = $2
            ORDER BY v.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        ))
        .bind(owner_id)
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total =
            sqlx::query_scalar::<Postgres, i64>("SELECT count(*) FROM videos WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((rows, total))
    }

    /// Update title/description
    #[tracing::instrument(skip(self, description), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    pub async fn update_details(
        &self,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Video, AppError> {
        let video = sqlx::query_as::<Postgres, Video>(&format!(
            r#"
            UPDATE videos
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        Ok(video)
    }

    /// Flip the publish flag, returning the new state.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    pub async fn toggle_published(&self, id: Uuid) -> Result<bool, AppError> {
        let published = sqlx::query_scalar::<Postgres, bool>(
            r#"
            UPDATE videos
            SET is_published = NOT is_published, updated_at = now()
            WHERE id = $1
            RETURNING is_published
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        Ok(published)
    }

    /// Single-statement view-count increment; no read-modify-write race.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    pub async fn increment_views(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a video row; comments, likes and playlist entries cascade.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        Ok(())
    }

    /// Aggregate counters for the owner's dashboard.
    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    pub async fn channel_stats(&self, owner_id: Uuid) -> Result<ChannelStats, AppError> {
        let stats = sqlx::query_as::<Postgres, ChannelStats>(
            r#"
            SELECT
                (SELECT count(*) FROM videos v WHERE v.owner_id = $1) AS total_videos,
                (SELECT COALESCE(sum(v.views), 0)::bigint FROM videos v WHERE v.owner_id = $1) AS total_views,
                (SELECT count(*) FROM subscriptions s WHERE s.channel_id = $1) AS total_subscribers,
                (SELECT count(*) FROM likes l
                 JOIN videos v ON v.id = l.video_id
                 WHERE v.owner_id = $1) AS total_likes
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

#[async_trait]
impl VideoStore for VideoRepository {
    async fn load(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        self.get(id).await
    }

    #[tracing::instrument(skip(self, url), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_thumbnail_url(&self, id: Uuid, url: &str) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE videos SET thumbnail_url = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(url)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Video not found".to_string()));
        }

        Ok(())
    }
}
