//! Request-scoped services: staged-upload handling and remote asset
//! synchronization.

pub mod assets;
pub mod staging;

pub use assets::{AssetService, BestEffort};
pub use staging::{StagedUpload, UploadLimits};
