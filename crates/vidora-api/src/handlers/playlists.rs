//! Playlist handlers.

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
use vidora_core::models::{Page, PageQuery, Playlist, PlaylistResponse, VideoResponse};
use vidora_core::AppError;

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePlaylistRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePlaylistRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Load a playlist and check the caller owns it.
async fn owned_playlist(
    state: &AppState,
    id: Uuid,
    owner_id: Uuid,
) -> Result<Playlist, AppError> {
    let playlist = state
        .db
        .playlists
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;

    if playlist.owner_id != owner_id {
        return Err(AppError::Forbidden(
            "Only the owner may modify this playlist".to_string(),
        ));
    }

    Ok(playlist)
}

#[utoipa::path(
    post,
    path = "/api/v1/playlists",
    tag = "playlists",
    request_body = CreatePlaylistRequest,
    responses(
        (status = 201, description = "Playlist created", body = Object)
    )
)]
#[tracing::instrument(skip(state, user, payload), fields(operation = "create_playlist", user_id = %user.0.id))]
pub async fn create_playlist(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<Playlist>), HttpAppError> {
    payload.validate().map_err(AppError::from)?;

    let playlist = state
        .db
        .playlists
        .create(
            user.0.id,
            payload.name.trim(),
            payload.description.as_deref().unwrap_or("").trim(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(playlist)))
}

#[utoipa::path(
    get,
    path = "/api/v1/playlists/{id}",
    tag = "playlists",
    params(("id" = Uuid, Path, description = "Playlist ID")),
    responses(
        (status = 200, description = "Playlist with video count", body = PlaylistResponse),
        (status = 404, description = "Playlist not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "get_playlist", playlist_id = %id))]
pub async fn get_playlist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PlaylistResponse>, HttpAppError> {
    let row = state
        .db
        .playlists
        .get_with_count(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;

    Ok(Json(PlaylistResponse::from(row)))
}

#[utoipa::path(
    get,
    path = "/api/v1/playlists/{id}/videos",
    tag = "playlists",
    params(
        ("id" = Uuid, Path, description = "Playlist ID"),
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Videos in playlist order", body = Object),
        (status = 404, description = "Playlist not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, viewer), fields(operation = "playlist_videos", playlist_id = %id))]
pub async fn playlist_videos(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    Path(id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<VideoResponse>>, HttpAppError> {
    state
        .db
        .playlists
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;

    let (rows, total) = state.db.playlists.videos_in(id, viewer.id(), &page).await?;

    Ok(Json(
        Page::new(rows, &page, total).map(VideoResponse::from),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/channels/{handle}/playlists",
    tag = "playlists",
    params(
        ("handle" = String, Path, description = "Channel handle"),
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Channel's playlists", body = Object),
        (status = 404, description = "Channel not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "channel_playlists"))]
pub async fn channel_playlists(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<PlaylistResponse>>, HttpAppError> {
    let channel = state
        .db
        .users
        .get_by_handle(&handle)
        .await?
        .ok_or_else(|| AppError::NotFound("Channel not found".to_string()))?;

    let (rows, total) = state
        .db
        .playlists
        .list_for_owner(channel.id, &page)
        .await?;

    Ok(Json(
        Page::new(rows, &page, total).map(PlaylistResponse::from),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v1/playlists/{id}",
    tag = "playlists",
    params(("id" = Uuid, Path, description = "Playlist ID")),
    request_body = UpdatePlaylistRequest,
    responses(
        (status = 200, description = "Playlist updated", body = Object),
        (status = 403, description = "Not the owner", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, payload), fields(operation = "update_playlist", playlist_id = %id))]
pub async fn update_playlist(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlaylistRequest>,
) -> Result<Json<Playlist>, HttpAppError> {
    payload.validate().map_err(AppError::from)?;
    owned_playlist(&state, id, user.0.id).await?;

    let playlist = state
        .db
        .playlists
        .update(id, payload.name.as_deref(), payload.description.as_deref())
        .await?;

    Ok(Json(playlist))
}

#[utoipa::path(
    delete,
    path = "/api/v1/playlists/{id}",
    tag = "playlists",
    params(("id" = Uuid, Path, description = "Playlist ID")),
    responses(
        (status = 204, description = "Playlist deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "delete_playlist", playlist_id = %id))]
pub async fn delete_playlist(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    owned_playlist(&state, id, user.0.id).await?;
    state.db.playlists.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/playlists/{id}/videos/{video_id}",
    tag = "playlists",
    params(
        ("id" = Uuid, Path, description = "Playlist ID"),
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 204, description = "Video appended (no-op if already present)"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Playlist or video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "playlist_add_video", playlist_id = %id, video_id = %video_id))]
pub async fn add_video(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((id, video_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, HttpAppError> {
    owned_playlist(&state, id, user.0.id).await?;

    state
        .db
        .videos
        .get(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    state.db.playlists.add_video(id, video_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/v1/playlists/{id}/videos/{video_id}",
    tag = "playlists",
    params(
        ("id" = Uuid, Path, description = "Playlist ID"),
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 204, description = "Video removed"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Not in playlist", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "playlist_remove_video", playlist_id = %id, video_id = %video_id))]
pub async fn remove_video(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path((id, video_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, HttpAppError> {
    owned_playlist(&state, id, user.0.id).await?;
    state.db.playlists.remove_video(id, video_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
