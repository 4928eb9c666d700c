//! Like handlers: toggles on videos and comments, plus the caller's liked
//! videos.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use vidora_core::models::{Page, PageQuery, VideoResponse};
use vidora_core::AppError;

use crate::auth::CurrentUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    pub liked: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/like",
    tag = "likes",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "toggle_video_like", video_id = %id))]
pub async fn toggle_video_like(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeResponse>, HttpAppError> {
    state
        .db
        .videos
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    let liked = state.db.likes.toggle_video_like(user.0.id, id).await?;

    Ok(Json(LikeResponse { liked }))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{id}/like",
    tag = "likes",
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "toggle_comment_like", comment_id = %id))]
pub async fn toggle_comment_like(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeResponse>, HttpAppError> {
    state
        .db
        .comments
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    let liked = state.db.likes.toggle_comment_like(user.0.id, id).await?;

    Ok(Json(LikeResponse { liked }))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me/likes",
    tag = "likes",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Liked videos, most recent first", body = Object)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "liked_videos", user_id = %user.0.id))]
pub async fn liked_videos(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<VideoResponse>>, HttpAppError> {
    let (rows, total) = state.db.likes.liked_videos(user.0.id, &page).await?;

    Ok(Json(
        Page::new(rows, &page, total).map(VideoResponse::from),
    ))
}
