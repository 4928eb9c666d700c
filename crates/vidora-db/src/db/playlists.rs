use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vidora_core::models::{PageQuery, Playlist, PlaylistListRow, VideoListRow};
use vidora_core::AppError;

const PLAYLIST_COLUMNS: &str = "id, owner_id, name, description, created_at, updated_at";

/// Repository for managing playlists
#[derive(Clone)]
pub struct PlaylistRepository {
    pool: PgPool,
}

impl PlaylistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a playlist
    #[tracing::instrument(skip(self, description), fields(db.table = "playlists", db.operation = "insert"))]
    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Playlist, AppError> {
        let playlist = sqlx::query_as::<Postgres, Playlist>(&format!(
            r#"
            INSERT INTO playlists (owner_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING {PLAYLIST_COLUMNS}
            "#,
        ))
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(playlist)
    }

    /// Get playlist by ID
    #[tracing::instrument(skip(self), fields(db.table = "playlists", db.operation = "select", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Playlist>, AppError> {
        let playlist = sqlx::query_as::<Postgres, Playlist>(&format!(
            "SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(playlist)
    }

    /// Get playlist with its video count
    #[tracing::instrument(skip(self), fields(db.table = "playlists", db.operation = "select", db.record_id = %id))]
    pub async fn get_with_count(&self, id: Uuid) -> Result<Option<PlaylistListRow>, AppError> {
        let row = sqlx::query_as::<Postgres, PlaylistListRow>(
            r#"
            SELECT p.id, p.owner_id, p.name, p.description,
                   (SELECT count(*) FROM playlist_videos pv WHERE pv.playlist_id = p.id) AS video_count,
                   p.created_at, p.updated_at
            FROM playlists p
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// List a user's playlists
    #[tracing::instrument(skip(self), fields(db.table = "playlists", db.operation = "select"))]
    pub async fn list_for_owner(
        &self,
        owner_id: Uuid,
        page: &PageQuery,
    ) -> Result<(Vec<PlaylistListRow>, i64), AppError> {
        let (limit, offset) = page.bounds();

        let rows = sqlx::query_as::<Postgres, PlaylistListRow>(
            r#"
            SELECT p.id, p.owner_id, p.name, p.description,
                   (SELECT count(*) FROM playlist_videos pv WHERE pv.playlist_id = p.id) AS video_count,
                   p.created_at, p.updated_at
            FROM playlists p
            WHERE p.owner_id = $1
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total =
            sqlx::query_scalar::<Postgres, i64>("SELECT count(*) FROM playlists WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((rows, total))
    }

    /// Videos in a playlist, in position order, annotated for the viewer.
    #[tracing::instrument(skip(self), fields(db.table = "playlist_videos", db.operation = "select"))]
    pub async fn videos_in(
        &self,
        playlist_id: Uuid,
        viewer: Option<Uuid>,
        page: &PageQuery,
    ) -> Result<(Vec<VideoListRow>, i64), AppError> {
        let (limit, offset) = page.bounds();

        let rows = sqlx::query_as::<Postgres, VideoListRow>(
            r#"
            SELECT v.id, v.owner_id, u.handle AS owner_handle, v.title, v.description,
                   v.video_url, v.thumbnail_url, v.duration_seconds, v.views,
                   v.is_published, v.created_at,
                   (SELECT count(*) FROM likes l WHERE l.video_id = v.id) AS like_count,
                   EXISTS(SELECT 1 FROM likes l
                          WHERE l.video_id = v.id AND l.user_id = $1) AS is_liked
            FROM playlist_videos pv
            JOIN videos v ON v.id = pv.video_id
            JOIN users u ON u.id = v.owner_id
            WHERE pv.playlist_id = $2
            ORDER BY pv.position ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(viewer)
        .bind(playlist_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<Postgres, i64>(
            "SELECT count(*) FROM playlist_videos WHERE playlist_id = $1",
        )
        .bind(playlist_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Update name/description
    #[tracing::instrument(skip(self, description), fields(db.table = "playlists", db.operation = "update", db.record_id = %id))]
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Playlist, AppError> {
        let playlist = sqlx::query_as::<Postgres, Playlist>(&format!(
            r#"
            UPDATE playlists
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = now()
            WHERE id = $1
            RETURNING {PLAYLIST_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;

        Ok(playlist)
    }

    /// Delete a playlist; its entries cascade.
    #[tracing::instrument(skip(self), fields(db.table = "playlists", db.operation = "delete", db.record_id = %id))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Playlist not found".to_string()));
        }

        Ok(())
    }

    /// Append a video to a playlist; re-adding an existing entry is a no-op.
    #[tracing::instrument(skip(self), fields(db.table = "playlist_videos", db.operation = "insert"))]
    pub async fn add_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO playlist_videos (playlist_id, video_id, position)
            SELECT $1, $2, COALESCE(max(position) + 1, 0)
            FROM playlist_videos
            WHERE playlist_id = $1
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(playlist_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a video from a playlist
    #[tracing::instrument(skip(self), fields(db.table = "playlist_videos", db.operation = "delete"))]
    pub async fn remove_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2")
                .bind(playlist_id)
                .bind(video_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Video not in playlist".to_string()));
        }

        Ok(())
    }
}
