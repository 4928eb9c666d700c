//! Vidora Storage Library
//!
//! Object-storage abstraction for media assets. It includes the
//! `MediaStorage` trait and implementations for S3 and local filesystem.
//!
//! # Storage key format
//!
//! All backends share the same key layout: `media/{uuid}.{ext}`. The key is
//! the final path segment of the asset's public URL, so it can be derived
//! back from a stored URL when the asset must be deleted later (see `keys`).
//! Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalMediaStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3MediaStorage;
pub use traits::{MediaKind, MediaStorage, StorageError, StorageResult, UploadedAsset};
pub use vidora_core::config::StorageBackend;
