//! Token issuance, validation, rotation and revocation against an in-memory
//! principal store.

mod helpers;

use helpers::MemoryPrincipalStore;
use std::sync::Arc;
use uuid::Uuid;
use vidora_api::auth::TokenService;
use vidora_core::config::StorageBackend;
use vidora_core::{AppError, Config};

fn test_config(access_ttl_minutes: i64) -> Config {
    Config {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        database_url: "postgres://unused".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 1,
        access_token_secret: "access-secret-access-secret-0123".to_string(),
        access_token_ttl_minutes: access_ttl_minutes,
        refresh_token_secret: "refresh-secret-refresh-secret-01".to_string(),
        refresh_token_ttl_days: 7,
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        local_storage_path: Some("/tmp/unused".to_string()),
        local_storage_base_url: Some("http://localhost/files".to_string()),
        upload_spool_dir: None,
        remote_op_timeout_seconds: 5,
        max_image_size_bytes: 1024,
        image_allowed_extensions: vec!["jpg".to_string()],
        image_allowed_content_types: vec!["image/jpeg".to_string()],
        max_video_size_bytes: 1024,
        video_allowed_extensions: vec!["mp4".to_string()],
        video_allowed_content_types: vec!["video/mp4".to_string()],
        publish_on_upload: true,
    }
}

fn service(store: &Arc<MemoryPrincipalStore>) -> TokenService {
    TokenService::new(&test_config(15), Arc::clone(store) as Arc<dyn vidora_db::PrincipalStore>)
}

#[tokio::test]
async fn issue_then_authenticate_returns_the_principal() {
    let store = Arc::new(MemoryPrincipalStore::new());
    let user = store.insert_user("alice");
    let tokens = service(&store);

    let pair = tokens.issue(user.id).await.unwrap();
    let authed = tokens.authenticate(&pair.access_token).await.unwrap();

    assert_eq!(authed.id, user.id);
    assert_eq!(authed.handle, "alice");
    // Issuance persisted the refresh token on the user row.
    assert_eq!(
        store.stored_refresh_token(user.id),
        Some(pair.refresh_token)
    );
}

#[tokio::test]
async fn expired_access_token_is_unauthorized() {
    let store = Arc::new(MemoryPrincipalStore::new());
    let user = store.insert_user("alice");
    // Negative TTL: every issued access token is already expired.
    let tokens =
        TokenService::new(&test_config(-1), Arc::clone(&store) as Arc<dyn vidora_db::PrincipalStore>);

    let pair = tokens.issue(user.id).await.unwrap();
    let err = tokens.authenticate(&pair.access_token).await.unwrap_err();

    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let store = Arc::new(MemoryPrincipalStore::new());
    store.insert_user("alice");
    let tokens = service(&store);

    let err = tokens.authenticate("not-a-jwt").await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn authenticate_opt_never_errors() {
    let store = Arc::new(MemoryPrincipalStore::new());
    let user = store.insert_user("alice");
    let tokens = service(&store);

    assert!(tokens.authenticate_opt(None).await.is_none());
    assert!(tokens.authenticate_opt(Some("garbage")).await.is_none());

    let pair = tokens.issue(user.id).await.unwrap();
    let authed = tokens
        .authenticate_opt(Some(pair.access_token.as_str()))
        .await;
    assert_eq!(authed.map(|u| u.id), Some(user.id));
}

#[tokio::test]
async fn rotation_kills_the_presented_token() {
    let store = Arc::new(MemoryPrincipalStore::new());
    let user = store.insert_user("alice");
    let tokens = service(&store);

    let first = tokens.issue(user.id).await.unwrap();
    let second = tokens.rotate(&first.refresh_token).await.unwrap();
    assert_ne!(first.refresh_token, second.refresh_token);
    assert_eq!(
        store.stored_refresh_token(user.id),
        Some(second.refresh_token.clone())
    );

    // Reusing the superseded token must fail even though it has not expired.
    let err = tokens.rotate(&first.refresh_token).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    // And the stored token is untouched by the failed attempt.
    assert_eq!(
        store.stored_refresh_token(user.id),
        Some(second.refresh_token)
    );
}

#[tokio::test]
async fn concurrent_rotation_has_exactly_one_winner() {
    let store = Arc::new(MemoryPrincipalStore::new());
    let user = store.insert_user("alice");
    let tokens = service(&store);

    let pair = tokens.issue(user.id).await.unwrap();

    let (a, b) = tokio::join!(
        tokens.rotate(&pair.refresh_token),
        tokens.rotate(&pair.refresh_token)
    );

    let winners: Vec<_> = [&a, &b].into_iter().filter(|r| r.is_ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one rotation may win");

    let loser = if a.is_err() { a.as_ref() } else { b.as_ref() };
    assert!(matches!(
        loser.unwrap_err(),
        AppError::Unauthorized(_)
    ));

    let winner_pair = if let Ok(p) = &a { p } else { b.as_ref().unwrap() };
    assert_eq!(
        store.stored_refresh_token(user.id),
        Some(winner_pair.refresh_token.clone())
    );
}

#[tokio::test]
async fn revoke_clears_the_stored_token() {
    let store = Arc::new(MemoryPrincipalStore::new());
    let user = store.insert_user("alice");
    let tokens = service(&store);

    let pair = tokens.issue(user.id).await.unwrap();
    tokens.revoke(user.id).await.unwrap();
    assert_eq!(store.stored_refresh_token(user.id), None);

    // A signed, unexpired refresh token is dead once the field is cleared.
    let err = tokens.rotate(&pair.refresh_token).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn issuance_failures_are_server_faults() {
    let store = Arc::new(MemoryPrincipalStore::new());
    let tokens = service(&store);

    // Unknown principal: an internal error, never a client-caused one.
    let err = tokens.issue(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));

    // Persistence failure during issuance is also internal.
    let user = store.insert_user("bob");
    store
        .fail_writes
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let err = tokens.issue(user.id).await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
}
