//! Request extractors that identify the calling user.
//!
//! `CurrentUser` rejects with 401 when no valid access token is presented.
//! `MaybeUser` never rejects: routes that personalize output for signed-in
//! callers but remain usable anonymously take it instead.

use axum::extract::FromRequestParts;
use axum::http::header::{HeaderMap, AUTHORIZATION};
use axum::http::request::Parts;
use std::sync::Arc;
use uuid::Uuid;
use vidora_core::models::User;
use vidora_core::AppError;

use crate::auth::cookies::{get_cookie, ACCESS_COOKIE_NAME};
use crate::error::HttpAppError;
use crate::state::AppState;

/// The authenticated caller, stripped of credential fields.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub handle: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            handle: user.handle,
            email: user.email,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            cover_url: user.cover_url,
        }
    }
}

/// Pull the access token from the bearer header or the token cookie.
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(header) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        if let Some(token) = header.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }
    get_cookie(headers, ACCESS_COOKIE_NAME)
}

/// Required authentication: rejects with 401 when absent or invalid.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_access_token(&parts.headers).ok_or_else(|| {
            HttpAppError(AppError::Unauthorized("Missing access token".to_string()))
        })?;

        let user = state.auth.tokens.authenticate(&token).await?;
        Ok(CurrentUser(user))
    }
}

/// Optional authentication: any missing/invalid credential yields `None`.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    /// Caller's user id, when signed in.
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_access_token(&parts.headers);
        let user = state.auth.tokens.authenticate_opt(token.as_deref()).await;
        Ok(MaybeUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("access_token=from-cookie"),
        );
        assert_eq!(
            extract_access_token(&headers),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("access_token=from-cookie"),
        );
        assert_eq!(
            extract_access_token(&headers),
            Some("from-cookie".to_string())
        );
    }

    #[test]
    fn test_malformed_auth_header_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_access_token(&headers), None);
    }
}
