use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vidora_core::models::{PageQuery, VideoListRow};
use vidora_core::AppError;

/// Repository for managing likes on videos and comments
#[derive(Clone)]
pub struct LikeRepository {
    pool: PgPool,
}

impl LikeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Toggle the caller's like on a video. Returns whether it is liked now.
    #[tracing::instrument(skip(self), fields(db.table = "likes", db.operation = "toggle"))]
    pub async fn toggle_video_like(&self, user_id: Uuid, video_id: Uuid) -> Result<bool, AppError> {
        let removed =
            sqlx::query("DELETE FROM likes WHERE user_id = $1 AND video_id = $2")
                .bind(user_id)
                .bind(video_id)
                .execute(&self.pool)
                .await?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        // ON CONFLICT absorbs the race with a concurrent identical toggle.
        sqlx::query(
            "INSERT INTO likes (user_id, video_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Toggle the caller's like on a comment. Returns whether it is liked now.
    #[tracing::instrument(skip(self), fields(db.table = "likes", db.operation = "toggle"))]
    pub async fn toggle_comment_like(
        &self,
        user_id: Uuid,
        comment_id: Uuid,
    ) -> Result<bool, AppError> {
        let removed =
            sqlx::query("DELETE FROM likes WHERE user_id = $1 AND comment_id = $2")
                .bind(user_id)
                .bind(comment_id)
                .execute(&self.pool)
                .await?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO likes (user_id, comment_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(comment_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Videos the user has liked, most recently liked first.
    #[tracing::instrument(skip(self), fields(db.table = "likes", db.operation = "select"))]
    pub async fn liked_videos(
        &self,
        user_id: Uuid,
        page: &PageQuery,
    ) -> Result<(Vec<VideoListRow>, i64), AppError> {
        let (limit, offset) = page.bounds();

        let rows = sqlx::query_as::<Postgres, VideoListRow>(
            r#"
            SELECT v.id, v.owner_id, u.handle AS owner_handle, v.title, v.description,
                   v.video_url, v.thumbnail_url, v.duration_seconds, v.views,
                   v.is_published, v.created_at,
                   (SELECT count(*) FROM likes l2 WHERE l2.video_id = v.id) AS like_count,
                   TRUE AS is_liked
            FROM likes l
            JOIN videos v ON v.id = l.video_id
            JOIN users u ON u.id = v.owner_id
            WHERE l.user_id = $1 AND v.is_published = TRUE
            ORDER BY l.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT count(*)
            FROM likes l
            JOIN videos v ON v.id = l.video_id
            WHERE l.user_id = $1 AND v.is_published = TRUE
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }
}
