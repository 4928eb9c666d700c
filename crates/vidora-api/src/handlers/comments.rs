//! Comment handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;
use vidora_core::models::{Comment, CommentResponse, Page, PageQuery};
use vidora_core::AppError;

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

/// Comments are listed only for videos their audience can see.
async fn visible_video(
    state: &AppState,
    video_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<(), AppError> {
    let video = state
        .db
        .videos
        .get(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    if !video.is_published && viewer != Some(video.owner_id) {
        return Err(AppError::NotFound("Video not found".to_string()));
    }

    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}/comments",
    tag = "comments",
    params(
        ("id" = Uuid, Path, description = "Video ID"),
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Comments, newest first", body = Object),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, viewer), fields(operation = "list_comments", video_id = %id))]
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    Path(id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<CommentResponse>>, HttpAppError> {
    visible_video(&state, id, viewer.id()).await?;

    let (rows, total) = state
        .db
        .comments
        .list_for_video(id, viewer.id(), &page)
        .await?;

    Ok(Json(
        Page::new(rows, &page, total).map(CommentResponse::from),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/comments",
    tag = "comments",
    params(("id" = Uuid, Path, description = "Video ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = Object),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, payload), fields(operation = "create_comment", video_id = %id))]
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), HttpAppError> {
    payload.validate().map_err(AppError::from)?;
    visible_video(&state, id, Some(user.0.id)).await?;

    let comment = state
        .db
        .comments
        .create(id, user.0.id, payload.body.trim())
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/comments/{id}",
    tag = "comments",
    params(("id" = Uuid, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = Object),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, payload), fields(operation = "update_comment", comment_id = %id))]
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<Comment>, HttpAppError> {
    payload.validate().map_err(AppError::from)?;

    let comment = state
        .db
        .comments
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != user.0.id {
        return Err(
            AppError::Forbidden("Only the author may edit this comment".to_string()).into(),
        );
    }

    let updated = state.db.comments.update(id, payload.body.trim()).await?;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    tag = "comments",
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "delete_comment", comment_id = %id))]
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    let comment = state
        .db
        .comments
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    if comment.author_id != user.0.id {
        return Err(
            AppError::Forbidden("Only the author may delete this comment".to_string()).into(),
        );
    }

    state.db.comments.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
