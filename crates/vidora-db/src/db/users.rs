use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vidora_core::models::{AssetSlot, ChannelProfile, User};
use vidora_core::AppError;

use super::traits::PrincipalStore;

const USER_COLUMNS: &str = "id, handle, email, display_name, password_hash, refresh_token, \
                            avatar_url, cover_url, created_at, updated_at";

/// Map unique-constraint violations to a 409 instead of a generic 500.
fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::Conflict("Handle or email already taken".to_string());
        }
    }
    AppError::Database(err)
}

/// Repository for managing users
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    #[tracing::instrument(skip(self, password_hash), fields(db.table = "users", db.operation = "insert"))]
    pub async fn create(
        &self,
        handle: &str,
        email: &str,
        display_name: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            r#"
            INSERT INTO users (handle, email, display_name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(handle)
        .bind(email)
        .bind(display_name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(user)
    }

    /// Get user by ID
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by handle
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn get_by_handle(&self, handle: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(handle) = lower($1)"
        ))
        .bind(handle)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by handle or email, for login
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn get_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(handle) = lower($1) OR lower(email) = lower($1)"
        ))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update display name and/or email
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    pub async fn update_profile(
        &self,
        id: Uuid,
        display_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                email = COALESCE($3, email),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(display_name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    /// Replace the password hash
    #[tracing::instrument(skip(self, password_hash), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    /// Channel profile with subscription counters, annotated for the viewer.
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn channel_profile(
        &self,
        handle: &str,
        viewer: Option<Uuid>,
    ) -> Result<Option<ChannelProfile>, AppError> {
        #[derive(sqlx::FromRow)]
        struct ProfileRow {
            id: Uuid,
            handle: String,
            display_name: String,
            avatar_url: Option<String>,
            cover_url: Option<String>,
            subscriber_count: i64,
            subscribed_to_count: i64,
            is_subscribed: bool,
        }

        let row = sqlx::query_as::<Postgres, ProfileRow>(
            r#"
            SELECT u.id, u.handle, u.display_name, u.avatar_url, u.cover_url,
                   (SELECT count(*) FROM subscriptions s WHERE s.channel_id = u.id) AS subscriber_count,
                   (SELECT count(*) FROM subscriptions s WHERE s.subscriber_id = u.id) AS subscribed_to_count,
                   EXISTS(SELECT 1 FROM subscriptions s
                          WHERE s.channel_id = u.id AND s.subscriber_id = $2) AS is_subscribed
            FROM users u
            WHERE lower(u.handle) = lower($1)
            "#,
        )
        .bind(handle)
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| ChannelProfile {
            id: r.id,
            handle: r.handle,
            display_name: r.display_name,
            avatar_url: r.avatar_url,
            cover_url: r.cover_url,
            subscriber_count: r.subscriber_count,
            subscribed_to_count: r.subscribed_to_count,
            is_subscribed: r.is_subscribed,
        }))
    }
}

#[async_trait]
impl PrincipalStore for UserRepository {
    async fn load(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.get_by_id(id).await
    }

    #[tracing::instrument(skip(self, token), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    async fn set_refresh_token(&self, id: Uuid, token: &str) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE users SET refresh_token = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(token)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    /// Compare-and-swap: only the row still holding `expected` is updated,
    /// so of two concurrent rotations at most one can win.
    #[tracing::instrument(skip(self, expected, new), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        new: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $3, updated_at = now()
            WHERE id = $1 AND refresh_token = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    async fn clear_refresh_token(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET refresh_token = NULL, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self, url), fields(db.table = "users", db.operation = "update", db.record_id = %id, slot = %slot))]
    async fn set_asset_url(&self, id: Uuid, slot: AssetSlot, url: &str) -> Result<(), AppError> {
        // Column name comes from the AssetSlot enum, not caller input.
        let query = format!(
            "UPDATE users SET {} = $2, updated_at = now() WHERE id = $1",
            slot.column()
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(url)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }
}
