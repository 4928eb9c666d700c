//! Channel-owner dashboard: aggregate stats and the full video list
//! including unpublished entries.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use vidora_core::models::{ChannelStats, Page, PageQuery, VideoResponse};

use crate::auth::CurrentUser;
use crate::error::HttpAppError;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    tag = "dashboard",
    responses(
        (status = 200, description = "Aggregate channel counters", body = ChannelStats)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "dashboard_stats", user_id = %user.0.id))]
pub async fn stats(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<ChannelStats>, HttpAppError> {
    let stats = state.db.videos.channel_stats(user.0.id).await?;

    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/videos",
    tag = "dashboard",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Owner's videos including unpublished", body = Object)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "dashboard_videos", user_id = %user.0.id))]
pub async fn my_videos(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<VideoResponse>>, HttpAppError> {
    let (rows, total) = state.db.videos.list_for_owner(user.0.id, &page).await?;

    Ok(Json(
        Page::new(rows, &page, total).map(VideoResponse::from),
    ))
}
