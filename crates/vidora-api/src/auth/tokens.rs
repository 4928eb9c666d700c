//! Token issuance, validation and rotation.
//!
//! Access tokens are short-lived HS256 JWTs that are never stored
//! server-side. Refresh tokens are longer-lived HS256 JWTs (separate secret)
//! persisted on the user row; rotation replaces the stored value through a
//! conditional update, so a superseded token is dead even before it expires
//! and concurrent rotations have exactly one winner.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use vidora_core::models::{TokenPair, User};
use vidora_core::{AppError, Config};
use vidora_db::PrincipalStore;

use super::extract::AuthUser;

/// Claims carried by the access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub handle: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by the refresh token. `jti` makes every issuance unique,
/// so tokens minted within the same second still differ; the stored-value
/// comparison depends on that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Issues, validates, rotates and revokes token pairs.
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn PrincipalStore>,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &Config, store: Arc<dyn PrincipalStore>) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_token_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_token_ttl_days),
            store,
        }
    }

    /// Access token lifetime in seconds, for cookie Max-Age and `expires_in`.
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Refresh token lifetime in seconds, for cookie Max-Age.
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl.num_seconds()
    }

    /// Mint a fresh token pair and persist the refresh token on the user row
    /// (overwriting any prior value; this is the rotation point).
    ///
    /// Issuance can only fail on the server side, so every failure maps to
    /// `Internal`, never to a client-caused error.
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn issue(&self, user_id: Uuid) -> Result<TokenPair, AppError> {
        let user = self
            .store
            .load(user_id)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to load user for issuance: {}", e)))?
            .ok_or_else(|| {
                AppError::Internal(format!("Token issuance for unknown user {}", user_id))
            })?;

        let pair = self.sign_pair(&user)?;

        self.store
            .set_refresh_token(user.id, &pair.refresh_token)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to persist refresh token: {}", e)))?;

        Ok(pair)
    }

    /// Verify an access token and load its user, stripped of credentials.
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, AppError> {
        let claims = self.verify_access(token)?;

        let user = self
            .store
            .load(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        Ok(AuthUser::from(user))
    }

    /// Optional-mode authentication: any failure yields `None` so routes
    /// that personalize output for signed-in callers keep working
    /// anonymously.
    pub async fn authenticate_opt(&self, token: Option<&str>) -> Option<AuthUser> {
        match token {
            Some(token) => self.authenticate(token).await.ok(),
            None => None,
        }
    }

    /// Rotate a refresh token: verify it, then atomically swap the stored
    /// value for a fresh one. The conditional update is the replay check:
    /// a token that no longer matches the stored value has been superseded,
    /// and of two concurrent rotations at most one can win.
    #[tracing::instrument(skip(self, presented))]
    pub async fn rotate(&self, presented: &str) -> Result<TokenPair, AppError> {
        let claims = self.verify_refresh(presented)?;

        let user = self
            .store
            .load(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        let pair = self.sign_pair(&user)?;

        let swapped = self
            .store
            .swap_refresh_token(user.id, presented, &pair.refresh_token)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to persist refresh token: {}", e)))?;

        if !swapped {
            return Err(AppError::Unauthorized(
                "Refresh token expired or already used".to_string(),
            ));
        }

        Ok(pair)
    }

    /// Clear the stored refresh token. Already-issued access tokens stay
    /// valid until natural expiry; the short TTL bounds the exposure window.
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn revoke(&self, user_id: Uuid) -> Result<(), AppError> {
        self.store.clear_refresh_token(user_id).await
    }

    fn sign_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let now = Utc::now();

        let access_claims = AccessClaims {
            sub: user.id,
            handle: user.handle.clone(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        let access_token = encode(&Header::default(), &access_claims, &self.access_encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign access token: {}", e)))?;

        let refresh_claims = RefreshClaims {
            sub: user.id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        let refresh_token = encode(&Header::default(), &refresh_claims, &self.refresh_encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign refresh token: {}", e)))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
        decode::<AccessClaims>(token, &self.access_decoding, &strict_validation())
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &strict_validation())
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }
}

/// HS256 validation with strict settings: expiry enforced with zero leeway.
fn strict_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> AppError {
    tracing::debug!("JWT validation failed: {}", e);
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token has expired".to_string())
        }
        _ => AppError::Unauthorized(format!("Invalid or expired token: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn encoding(secret: &str) -> EncodingKey {
        EncodingKey::from_secret(secret.as_bytes())
    }

    fn decoding(secret: &str) -> DecodingKey {
        DecodingKey::from_secret(secret.as_bytes())
    }

    #[test]
    fn test_access_claims_round_trip() {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: Uuid::new_v4(),
            handle: "alice".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(15)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &encoding("secret")).unwrap();
        let decoded =
            decode::<AccessClaims>(&token, &decoding("secret"), &strict_validation()).unwrap();
        assert_eq!(decoded.claims.sub, claims.sub);
        assert_eq!(decoded.claims.handle, "alice");
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: Uuid::new_v4(),
            handle: "alice".to_string(),
            iat: (now - Duration::minutes(30)).timestamp(),
            exp: (now - Duration::minutes(15)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &encoding("secret")).unwrap();
        let err =
            decode::<AccessClaims>(&token, &decoding("secret"), &strict_validation()).unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: Uuid::new_v4(),
            handle: "alice".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(15)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &encoding("secret")).unwrap();
        assert!(decode::<AccessClaims>(&token, &decoding("other"), &strict_validation()).is_err());
    }
}
