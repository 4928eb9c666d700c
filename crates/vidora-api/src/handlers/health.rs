use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check: verifies database connectivity.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 500, description = "Database unreachable")
    )
)]
pub async fn healthz(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, HttpAppError> {
    sqlx::query("SELECT 1")
        .execute(&state.db.pool)
        .await
        .map_err(vidora_core::AppError::Database)?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}
