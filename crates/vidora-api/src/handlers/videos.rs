//! Video handlers: upload, listing, detail, metadata and thumbnail updates,
//! publish toggling, and deletion with best-effort remote cleanup.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;
use vidora_core::models::{Page, PageQuery, Video, VideoResponse};
use vidora_core::AppError;
use vidora_db::VideoFilter;
use vidora_storage::MediaKind;

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::staging::stage_field;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct VideoListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Only videos from this channel handle.
    pub owner: Option<String>,
    /// Case-insensitive title/description search.
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateVideoRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublishResponse {
    pub is_published: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThumbnailResponse {
    pub thumbnail_url: String,
}

/// Build a response for a video row that has no likes yet.
fn fresh_video_response(video: Video, owner_handle: String) -> VideoResponse {
    VideoResponse {
        id: video.id,
        owner_id: video.owner_id,
        owner_handle,
        title: video.title,
        description: video.description,
        video_url: video.video_url,
        thumbnail_url: video.thumbnail_url,
        duration_seconds: video.duration_seconds,
        views: video.views,
        is_published: video.is_published,
        like_count: 0,
        is_liked: false,
        created_at: video.created_at,
    }
}

/// Load a video and check the caller owns it.
async fn owned_video(state: &AppState, id: Uuid, owner_id: Uuid) -> Result<Video, AppError> {
    let video = state
        .db
        .videos
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    if video.owner_id != owner_id {
        return Err(AppError::Forbidden(
            "Only the owner may modify this video".to_string(),
        ));
    }

    Ok(video)
}

#[utoipa::path(
    post,
    path = "/api/v1/videos",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video uploaded", body = VideoResponse),
        (status = 400, description = "Missing video file or title", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Storage upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, multipart), fields(operation = "upload_video", user_id = %user.0.id))]
pub async fn create_video(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<VideoResponse>), HttpAppError> {
    let mut title: Option<String> = None;
    let mut description = String::new();
    let mut staged_video = None;
    let mut staged_thumbnail = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        // Capture the name up front; stage_field/text consume the field.
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("video") => {
                staged_video = Some(
                    stage_field(
                        field,
                        state.media.spool_dir.as_ref(),
                        &state.media.video_limits,
                        MediaKind::Video,
                    )
                    .await?,
                );
            }
            Some("thumbnail") => {
                staged_thumbnail = Some(
                    stage_field(
                        field,
                        state.media.spool_dir.as_ref(),
                        &state.media.image_limits,
                        MediaKind::Image,
                    )
                    .await?,
                );
            }
            Some("title") => {
                title = Some(field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Invalid title field: {}", e))
                })?);
            }
            Some("description") => {
                description = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Invalid description field: {}", e))
                })?;
            }
            _ => {}
        }
    }

    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing title".to_string()))?;
    let staged_video = staged_video
        .ok_or_else(|| AppError::InvalidInput("Missing video file".to_string()))?;

    let video_asset = state.media.assets.store_new_asset(staged_video).await?;

    let thumbnail_asset = match staged_thumbnail {
        Some(staged) => match state.media.assets.store_new_asset(staged).await {
            Ok(asset) => Some(asset),
            Err(e) => {
                // The video blob is live but unreferenced; reclaim it.
                state.media.assets.delete_remote(&video_asset.url).await;
                return Err(e.into());
            }
        },
        None => None,
    };

    let inserted = state
        .db
        .videos
        .create(
            user.0.id,
            title.trim(),
            description.trim(),
            &video_asset.url,
            thumbnail_asset.as_ref().map(|a| a.url.as_str()),
            None,
            state.config.publish_on_upload,
        )
        .await;

    let video = match inserted {
        Ok(video) => video,
        Err(e) => {
            // Nothing references the fresh uploads yet, so clean them up
            // best-effort before surfacing the insert failure.
            state.media.assets.delete_remote(&video_asset.url).await;
            if let Some(thumb) = &thumbnail_asset {
                state.media.assets.delete_remote(&thumb.url).await;
            }
            return Err(e.into());
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(fresh_video_response(video, user.0.handle.clone())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos",
    tag = "videos",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)"),
        ("owner" = Option<String>, Query, description = "Filter by channel handle"),
        ("search" = Option<String>, Query, description = "Title/description search")
    ),
    responses(
        (status = 200, description = "Published videos", body = Object)
    )
)]
#[tracing::instrument(skip(state, viewer), fields(operation = "list_videos"))]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    Query(query): Query<VideoListQuery>,
) -> Result<Json<Page<VideoResponse>>, HttpAppError> {
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let filter = VideoFilter {
        owner_handle: query.owner,
        search: query.search,
    };

    let (rows, total) = state.db.videos.list(&filter, viewer.id(), &page).await?;

    Ok(Json(
        Page::new(rows, &page, total).map(VideoResponse::from),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video detail", body = VideoResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, viewer), fields(operation = "get_video", video_id = %id))]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let mut row = state
        .db
        .videos
        .get_annotated(id, viewer.id())
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    let is_owner = viewer.id() == Some(row.owner_id);

    // Unpublished videos exist only for their owner.
    if !row.is_published && !is_owner {
        return Err(AppError::NotFound("Video not found".to_string()).into());
    }

    if !is_owner {
        state.db.videos.increment_views(id).await?;
        row.views += 1;
    }

    Ok(Json(VideoResponse::from(row)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/videos/{id}",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    request_body = UpdateVideoRequest,
    responses(
        (status = 200, description = "Video updated", body = VideoResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, payload), fields(operation = "update_video", video_id = %id))]
pub async fn update_video(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Result<Json<VideoResponse>, HttpAppError> {
    payload.validate().map_err(AppError::from)?;
    owned_video(&state, id, user.0.id).await?;

    state
        .db
        .videos
        .update_details(id, payload.title.as_deref(), payload.description.as_deref())
        .await?;

    let row = state
        .db
        .videos
        .get_annotated(id, Some(user.0.id))
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    Ok(Json(VideoResponse::from(row)))
}

#[utoipa::path(
    put,
    path = "/api/v1/videos/{id}/thumbnail",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail replaced", body = ThumbnailResponse),
        (status = 400, description = "No file provided", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, multipart), fields(operation = "replace_thumbnail", video_id = %id))]
pub async fn replace_thumbnail(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ThumbnailResponse>, HttpAppError> {
    owned_video(&state, id, user.0.id).await?;

    let mut staged = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?
    {
        if field.file_name().is_some() {
            staged = Some(
                stage_field(
                    field,
                    state.media.spool_dir.as_ref(),
                    &state.media.image_limits,
                    MediaKind::Image,
                )
                .await?,
            );
            break;
        }
    }

    let thumbnail_url = state
        .media
        .assets
        .replace_video_thumbnail(id, staged)
        .await?;

    Ok(Json(ThumbnailResponse { thumbnail_url }))
}

#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/publish",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Publish state toggled", body = PublishResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "toggle_publish", video_id = %id))]
pub async fn toggle_publish(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublishResponse>, HttpAppError> {
    owned_video(&state, id, user.0.id).await?;

    let is_published = state.db.videos.toggle_published(id).await?;

    Ok(Json(PublishResponse { is_published }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/videos/{id}",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "delete_video", video_id = %id))]
pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    let video = owned_video(&state, id, user.0.id).await?;

    // Row first: comments/likes/playlist entries cascade with it. Remote
    // cleanup afterwards is best-effort; a storage failure must not block
    // the primary deletion.
    state.db.videos.delete(id).await?;

    state.media.assets.delete_remote(&video.video_url).await;
    if let Some(thumbnail_url) = &video.thumbnail_url {
        state.media.assets.delete_remote(thumbnail_url).await;
    }

    Ok(StatusCode::NO_CONTENT)
}
