use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vidora_core::models::{Comment, CommentListRow, PageQuery};
use vidora_core::AppError;

const COMMENT_COLUMNS: &str = "id, video_id, author_id, body, created_at, updated_at";

/// Repository for managing comments
#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a comment to a video
    #[tracing::instrument(skip(self, body), fields(db.table = "comments", db.operation = "insert"))]
    pub async fn create(
        &self,
        video_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<Comment, AppError> {
        let comment = sqlx::query_as::<Postgres, Comment>(&format!(
            r#"
            INSERT INTO comments (video_id, author_id, body)
            VALUES ($1, $2, $3)
            RETURNING {COMMENT_COLUMNS}
            "#,
        ))
        .bind(video_id)
        .bind(author_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    /// Get comment by ID
    #[tracing::instrument(skip(self), fields(db.table = "comments", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<Postgres, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    /// List a video's comments, newest first, annotated for the viewer.
    #[tracing::instrument(skip(self), fields(db.table = "comments", db.operation = "select"))]
    pub async fn list_for_video(
        &self,
        video_id: Uuid,
        viewer: Option<Uuid>,
        page: &PageQuery,
    ) -> Result<(Vec<CommentListRow>, i64), AppError> {
        let (limit, offset) = page.bounds();

        let rows = sqlx::query_as::<Postgres, CommentListRow>(
            r#"
            SELECT c.id, c.video_id, c.author_id, u.handle AS author_handle, c.body,
                   (SELECT count(*) FROM likes l WHERE l.comment_id = c.id) AS like_count,
                   EXISTS(SELECT 1 FROM likes l
                          WHERE l.comment_id = c.id AND l.user_id = $1) AS is_liked,
                   c.created_at, c.updated_at
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.video_id = $2
            ORDER BY c.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(viewer)
        .bind(video_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total =
            sqlx::query_scalar::<Postgres, i64>("SELECT count(*) FROM comments WHERE video_id = $1")
                .bind(video_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((rows, total))
    }

    /// Update a comment's body
    #[tracing::instrument(skip(self, body), fields(db.table = "comments", db.operation = "update", db.record_id = %id))]
    pub async fn update(&self, id: Uuid, body: &str) -> Result<Comment, AppError> {
        let comment = sqlx::query_as::<Postgres, Comment>(&format!(
            r#"
            UPDATE comments
            SET body = $2, updated_at = now()
            WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(body)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        Ok(comment)
    }

    /// Delete a comment
    #[tracing::instrument(skip(self), fields(db.table = "comments", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        Ok(())
    }
}
