//! Subscription handlers: toggle, audience listing, and the caller's
//! followed channels.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use vidora_core::models::{ChannelSummary, Page, PageQuery};
use vidora_core::AppError;

use crate::auth::CurrentUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscribeResponse {
    pub subscribed: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/channels/{handle}/subscribe",
    tag = "subscriptions",
    params(("handle" = String, Path, description = "Channel handle")),
    responses(
        (status = 200, description = "Subscription toggled", body = SubscribeResponse),
        (status = 400, description = "Cannot subscribe to yourself", body = ErrorResponse),
        (status = 404, description = "Channel not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "toggle_subscription"))]
pub async fn toggle_subscription(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(handle): Path<String>,
) -> Result<Json<SubscribeResponse>, HttpAppError> {
    let channel = state
        .db
        .users
        .get_by_handle(&handle)
        .await?
        .ok_or_else(|| AppError::NotFound("Channel not found".to_string()))?;

    if channel.id == user.0.id {
        return Err(
            AppError::InvalidInput("Cannot subscribe to your own channel".to_string()).into(),
        );
    }

    let subscribed = state.db.subscriptions.toggle(user.0.id, channel.id).await?;

    Ok(Json(SubscribeResponse { subscribed }))
}

#[utoipa::path(
    get,
    path = "/api/v1/channels/{handle}/subscribers",
    tag = "subscriptions",
    params(
        ("handle" = String, Path, description = "Channel handle"),
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Channel's subscribers", body = Object),
        (status = 404, description = "Channel not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "list_subscribers"))]
pub async fn list_subscribers(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<ChannelSummary>>, HttpAppError> {
    let channel = state
        .db
        .users
        .get_by_handle(&handle)
        .await?
        .ok_or_else(|| AppError::NotFound("Channel not found".to_string()))?;

    let (rows, total) = state
        .db
        .subscriptions
        .subscribers_of(channel.id, &page)
        .await?;

    Ok(Json(Page::new(rows, &page, total)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me/subscriptions",
    tag = "subscriptions",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Channels the caller follows", body = Object)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "list_subscriptions", user_id = %user.0.id))]
pub async fn my_subscriptions(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<ChannelSummary>>, HttpAppError> {
    let (rows, total) = state
        .db
        .subscriptions
        .subscriptions_of(user.0.id, &page)
        .await?;

    Ok(Json(Page::new(rows, &page, total)))
}
