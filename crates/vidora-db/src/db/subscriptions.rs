use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vidora_core::models::{ChannelSummary, PageQuery};
use vidora_core::AppError;

/// Select list producing [`ChannelSummary`] rows for a user aliased `u`.
const SUMMARY_SELECT: &str = r#"
    SELECT u.id, u.handle, u.display_name, u.avatar_url,
           (SELECT count(*) FROM subscriptions s2 WHERE s2.channel_id = u.id) AS subscriber_count
"#;

/// Repository for managing channel subscriptions
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Toggle a subscription. Returns whether the caller subscribes now.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "toggle"))]
    pub async fn toggle(&self, subscriber_id: Uuid, channel_id: Uuid) -> Result<bool, AppError> {
        let removed = sqlx::query(
            "DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;

        if removed.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO subscriptions (subscriber_id, channel_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Channels subscribing to the given channel (its audience).
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    pub async fn subscribers_of(
        &self,
        channel_id: Uuid,
        page: &PageQuery,
    ) -> Result<(Vec<ChannelSummary>, i64), AppError> {
        let (limit, offset) = page.bounds();

        let rows = sqlx::query_as::<Postgres, ChannelSummary>(&format!(
            r#"
            {SUMMARY_SELECT}
            FROM subscriptions s
            JOIN users u ON u.id = s.subscriber_id
            WHERE s.channel_id = $1
            ORDER BY s.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(channel_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<Postgres, i64>(
            "SELECT count(*) FROM subscriptions WHERE channel_id = $1",
        )
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Channels the given user follows.
    #[tracing::instrument(skip(self), fields(db.table = "subscriptions", db.operation = "select"))]
    pub async fn subscriptions_of(
        &self,
        subscriber_id: Uuid,
        page: &PageQuery,
    ) -> Result<(Vec<ChannelSummary>, i64), AppError> {
        let (limit, offset) = page.bounds();

        let rows = sqlx::query_as::<Postgres, ChannelSummary>(&format!(
            r#"
            {SUMMARY_SELECT}
            FROM subscriptions s
            JOIN users u ON u.id = s.channel_id
            WHERE s.subscriber_id = $1
            ORDER BY s.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(subscriber_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<Postgres, i64>(
            "SELECT count(*) FROM subscriptions WHERE subscriber_id = $1",
        )
        .bind(subscriber_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }
}
