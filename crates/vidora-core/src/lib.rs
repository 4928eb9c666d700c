//! Core types shared across the Vidora workspace: configuration, error
//! handling, and domain models.

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
