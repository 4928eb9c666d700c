//! Asset replacement and deletion against in-memory stores and a recording
//! storage fake: staged-file cleanup, capture-before-mutate, the
//! new-before-old ordering, and best-effort delete semantics.

mod helpers;

use helpers::{staged_upload, MemoryPrincipalStore, MemoryVideoStore, RecordingStorage};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use vidora_api::services::{AssetService, BestEffort};
use vidora_core::models::AssetSlot;
use vidora_core::AppError;
use vidora_storage::MediaKind;

struct Fixture {
    users: Arc<MemoryPrincipalStore>,
    videos: Arc<MemoryVideoStore>,
    storage: Arc<RecordingStorage>,
    assets: AssetService,
}

fn fixture() -> Fixture {
    fixture_with_timeout(Duration::from_secs(5))
}

fn fixture_with_timeout(timeout: Duration) -> Fixture {
    let users = Arc::new(MemoryPrincipalStore::new());
    let videos = Arc::new(MemoryVideoStore::new());
    let storage = Arc::new(RecordingStorage::new());
    let assets = AssetService::new(storage.clone(), users.clone(), videos.clone(), timeout);
    Fixture {
        users,
        videos,
        storage,
        assets,
    }
}

#[tokio::test]
async fn missing_staged_upload_fails_without_side_effects() {
    let f = fixture();
    let user = f.users.insert_user("alice");

    let err = f
        .assets
        .replace_user_asset(user.id, AssetSlot::Avatar, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
    assert_eq!(f.storage.upload_count(), 0);
    assert!(f.storage.deleted_keys().is_empty());
}

#[tokio::test]
async fn replace_success_updates_slot_and_deletes_old_exactly_once() {
    let f = fixture();
    let user = f.users.insert_user("alice");
    f.users.set_slot(
        user.id,
        AssetSlot::Avatar,
        "https://cdn.test/media/old.jpg",
    );

    let staged = staged_upload("new.jpg", MediaKind::Image);
    let staged_path = staged.path().to_path_buf();

    let new_url = f
        .assets
        .replace_user_asset(user.id, AssetSlot::Avatar, Some(staged))
        .await
        .unwrap();

    // Staged local file is gone.
    assert!(!staged_path.exists());
    // Slot holds the new reference.
    assert_eq!(f.users.slot(user.id, AssetSlot::Avatar), Some(new_url));
    // Exactly one delete, and it targeted the previous reference.
    assert_eq!(f.storage.deleted_keys(), vec!["media/old.jpg".to_string()]);
}

#[tokio::test]
async fn replace_with_empty_slot_deletes_nothing() {
    let f = fixture();
    let user = f.users.insert_user("alice");

    let staged = staged_upload("first.jpg", MediaKind::Image);
    f.assets
        .replace_user_asset(user.id, AssetSlot::Avatar, Some(staged))
        .await
        .unwrap();

    assert_eq!(f.storage.upload_count(), 1);
    assert!(f.storage.deleted_keys().is_empty());
}

#[tokio::test]
async fn failed_upload_cleans_staging_and_leaves_slot_untouched() {
    let f = fixture();
    let user = f.users.insert_user("alice");
    f.users.set_slot(
        user.id,
        AssetSlot::Avatar,
        "https://cdn.test/media/old.jpg",
    );
    f.storage.fail_uploads.store(true, Ordering::SeqCst);

    let staged = staged_upload("new.jpg", MediaKind::Image);
    let staged_path = staged.path().to_path_buf();

    let err = f
        .assets
        .replace_user_asset(user.id, AssetSlot::Avatar, Some(staged))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Storage(_)));
    assert!(!staged_path.exists());
    assert_eq!(
        f.users.slot(user.id, AssetSlot::Avatar),
        Some("https://cdn.test/media/old.jpg".to_string())
    );
    assert!(f.storage.deleted_keys().is_empty());
}

#[tokio::test(start_paused = true)]
async fn timed_out_upload_is_a_storage_error() {
    let f = fixture_with_timeout(Duration::from_millis(50));
    let user = f.users.insert_user("alice");
    f.storage.stall.store(true, Ordering::SeqCst);

    let staged = staged_upload("new.jpg", MediaKind::Image);
    let staged_path = staged.path().to_path_buf();

    let err = f
        .assets
        .replace_user_asset(user.id, AssetSlot::Avatar, Some(staged))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Storage(_)));
    assert!(!staged_path.exists());
}

#[tokio::test]
async fn failed_persist_orphans_the_new_asset_but_never_deletes_it() {
    let f = fixture();
    let user = f.users.insert_user("alice");
    f.users.set_slot(
        user.id,
        AssetSlot::Avatar,
        "https://cdn.test/media/old.jpg",
    );
    f.users.fail_writes.store(true, Ordering::SeqCst);

    let staged = staged_upload("new.jpg", MediaKind::Image);
    let staged_path = staged.path().to_path_buf();

    let err = f
        .assets
        .replace_user_asset(user.id, AssetSlot::Avatar, Some(staged))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Database(_)));
    assert!(!staged_path.exists());
    // The upload happened, but nothing was deleted: the documented leak is
    // the new orphan, never a missing old asset.
    assert_eq!(f.storage.upload_count(), 1);
    assert!(f.storage.deleted_keys().is_empty());

    f.users.fail_writes.store(false, Ordering::SeqCst);
    assert_eq!(
        f.users.slot(user.id, AssetSlot::Avatar),
        Some("https://cdn.test/media/old.jpg".to_string())
    );
}

#[tokio::test]
async fn avatar_replacement_scenario() {
    // P1 has avatar img/old.jpg; replacing it yields img/new.jpg semantics:
    // final slot = new URL, exactly one delete of the old key, staged file
    // removed.
    let f = fixture();
    let p1 = f.users.insert_user("p1");
    f.users.set_slot(p1.id, AssetSlot::Avatar, "https://cdn.test/media/old.jpg");

    let staged = staged_upload("new.jpg", MediaKind::Image);
    let staged_path = staged.path().to_path_buf();

    let final_url = f
        .assets
        .replace_user_asset(p1.id, AssetSlot::Avatar, Some(staged))
        .await
        .unwrap();

    assert_eq!(f.users.slot(p1.id, AssetSlot::Avatar), Some(final_url.clone()));
    assert!(final_url.ends_with(".jpg"));
    assert_eq!(f.storage.deleted_keys(), vec!["media/old.jpg".to_string()]);
    assert!(!staged_path.exists());
}

#[tokio::test]
async fn thumbnail_replacement_follows_the_same_flow() {
    let f = fixture();
    let user = f.users.insert_user("alice");
    let video = f
        .videos
        .insert_video(user.id, Some("https://cdn.test/media/thumb-old.png"));

    let staged = staged_upload("thumb-new.png", MediaKind::Image);

    let new_url = f
        .assets
        .replace_video_thumbnail(video.id, Some(staged))
        .await
        .unwrap();

    assert_eq!(f.videos.thumbnail(video.id), Some(new_url));
    assert_eq!(
        f.storage.deleted_keys(),
        vec!["media/thumb-old.png".to_string()]
    );
}

#[tokio::test]
async fn delete_remote_is_best_effort() {
    let f = fixture();

    // A URL this service produced: derives the key and deletes.
    let outcome = f
        .assets
        .delete_remote("https://cdn.test/media/clip.mp4")
        .await;
    assert_eq!(outcome, BestEffort::Completed);
    assert_eq!(f.storage.deleted_keys(), vec!["media/clip.mp4".to_string()]);

    // A foreign URL: no key derivable, absorbed as a failure, no call made.
    let outcome = f.assets.delete_remote("https://elsewhere.example/x.jpg").await;
    assert_eq!(outcome, BestEffort::Failed);
    assert_eq!(f.storage.deleted_keys().len(), 1);
}

#[tokio::test]
async fn delete_remote_infers_kind_from_url_shape() {
    let f = fixture();

    f.assets
        .delete_remote("https://cdn.test/media/clip.mp4")
        .await;
    f.assets
        .delete_remote("https://cdn.test/media/pic.jpg")
        .await;

    let deletes = f.storage.deletes.lock().unwrap().clone();
    assert_eq!(deletes[0].1, MediaKind::Video);
    assert_eq!(deletes[1].1, MediaKind::Image);
}
