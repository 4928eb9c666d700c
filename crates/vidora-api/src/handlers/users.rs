//! Account and session handlers: registration, login/logout, token refresh,
//! profile updates, asset-slot replacement, and channel profiles.

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;
use vidora_core::models::{AssetSlot, ChannelProfile, TokenPair, UserResponse};
use vidora_core::AppError;
use vidora_storage::MediaKind;

use crate::auth::cookies::{
    clear_token_cookies, get_cookie, set_token_cookies, REFRESH_COOKIE_NAME,
};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::staging::stage_field;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30))]
    pub handle: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Handle or email address.
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub tokens: TokenPair,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssetUrlResponse {
    pub url: String,
}

/// Handles are restricted to characters that survive URLs unescaped.
fn validate_handle(handle: &str) -> Result<(), AppError> {
    if !handle
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::InvalidInput(
            "Handle may only contain letters, digits, '_' and '-'".to_string(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Handle or email taken", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, payload), fields(operation = "register"))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), HttpAppError> {
    payload.validate().map_err(AppError::from)?;
    validate_handle(&payload.handle)?;

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .db
        .users
        .create(
            &payload.handle,
            &payload.email,
            &payload.display_name,
            &password_hash,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; token cookies set", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, payload), fields(operation = "login"))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), HttpAppError> {
    let user = state
        .db
        .users
        .get_by_login(&payload.login)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()).into());
    }

    let tokens = state.auth.tokens.issue(user.id).await?;

    let mut headers = HeaderMap::new();
    set_token_cookies(
        &mut headers,
        &tokens,
        state.auth.tokens.access_ttl_seconds(),
        state.auth.tokens.refresh_ttl_seconds(),
    );

    Ok((
        headers,
        Json(LoginResponse {
            user: UserResponse::from(user),
            tokens,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    tag = "users",
    responses(
        (status = 204, description = "Signed out; token cookies cleared"),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user), fields(operation = "logout", user_id = %user.0.id))]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<(StatusCode, HeaderMap), HttpAppError> {
    state.auth.tokens.revoke(user.0.id).await?;

    let mut headers = HeaderMap::new();
    clear_token_cookies(&mut headers);

    Ok((StatusCode::NO_CONTENT, headers))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/refresh",
    tag = "users",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Fresh token pair; cookies rotated", body = TokenPair),
        (status = 401, description = "Refresh token missing, expired or already used", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers, body), fields(operation = "refresh"))]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<(HeaderMap, Json<TokenPair>), HttpAppError> {
    // Cookie first; a JSON body supports non-browser clients. Browsers post
    // an empty body here, so parse failures just mean "no body token".
    let presented = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .or_else(|| {
            serde_json::from_str::<RefreshRequest>(&body)
                .ok()
                .and_then(|p| p.refresh_token)
        })
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let tokens = state.auth.tokens.rotate(&presented).await?;

    let mut response_headers = HeaderMap::new();
    set_token_cookies(
        &mut response_headers,
        &tokens,
        state.auth.tokens.access_ttl_seconds(),
        state.auth.tokens.refresh_ttl_seconds(),
    );

    Ok((response_headers, Json(tokens)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<UserResponse>, HttpAppError> {
    let user = state
        .db
        .users
        .get_by_id(user.0.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 409, description = "Email taken", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, payload), fields(operation = "update_profile", user_id = %user.0.id))]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, HttpAppError> {
    payload.validate().map_err(AppError::from)?;

    if payload.display_name.is_none() && payload.email.is_none() {
        return Err(AppError::InvalidInput("Nothing to update".to_string()).into());
    }

    let user = state
        .db
        .users
        .update_profile(
            user.0.id,
            payload.display_name.as_deref(),
            payload.email.as_deref(),
        )
        .await?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/me/password",
    tag = "users",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed; refresh token revoked"),
        (status = 401, description = "Current password wrong", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, payload), fields(operation = "change_password", user_id = %user.0.id))]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, HttpAppError> {
    payload.validate().map_err(AppError::from)?;

    let stored = state
        .db
        .users
        .get_by_id(user.0.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    if !verify_password(&payload.current_password, &stored.password_hash)? {
        return Err(AppError::Unauthorized("Current password is incorrect".to_string()).into());
    }

    let new_hash = hash_password(&payload.new_password)?;
    state.db.users.update_password(user.0.id, &new_hash).await?;

    // Changing the password signs out every other session.
    state.auth.tokens.revoke(user.0.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Shared flow for the avatar and cover endpoints: stage the first file
/// field, then hand it to the asset service.
async fn replace_slot(
    state: &AppState,
    user_id: uuid::Uuid,
    slot: AssetSlot,
    mut multipart: Multipart,
) -> Result<String, HttpAppError> {
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

    let url = state
        .media
        .assets
        .replace_user_asset(user_id, slot, staged)
        .await?;

    Ok(url)
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/me/avatar",
    tag = "users",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Avatar replaced", body = AssetUrlResponse),
        (status = 400, description = "No file provided", body = ErrorResponse),
        (status = 500, description = "Storage upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, multipart), fields(operation = "update_avatar", user_id = %user.0.id))]
pub async fn update_avatar(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<AssetUrlResponse>, HttpAppError> {
    let url = replace_slot(&state, user.0.id, AssetSlot::Avatar, multipart).await?;
    Ok(Json(AssetUrlResponse { url }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/me/cover",
    tag = "users",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Cover image replaced", body = AssetUrlResponse),
        (status = 400, description = "No file provided", body = ErrorResponse),
        (status = 500, description = "Storage upload failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, user, multipart), fields(operation = "update_cover", user_id = %user.0.id))]
pub async fn update_cover(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<AssetUrlResponse>, HttpAppError> {
    let url = replace_slot(&state, user.0.id, AssetSlot::Cover, multipart).await?;
    Ok(Json(AssetUrlResponse { url }))
}

#[utoipa::path(
    get,
    path = "/api/v1/channels/{handle}",
    tag = "channels",
    params(("handle" = String, Path, description = "Channel handle")),
    responses(
        (status = 200, description = "Channel profile", body = ChannelProfile),
        (status = 404, description = "Channel not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, viewer), fields(operation = "channel_profile"))]
pub async fn channel_profile(
    State(state): State<Arc<AppState>>,
    viewer: MaybeUser,
    Path(handle): Path<String>,
) -> Result<Json<ChannelProfile>, HttpAppError> {
    let profile = state
        .db
        .users
        .channel_profile(&handle, viewer.id())
        .await?
        .ok_or_else(|| AppError::NotFound("Channel not found".to_string()))?;

    Ok(Json(profile))
}
