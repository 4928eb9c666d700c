//! Storage backend setup

use anyhow::{Context, Result};
use std::sync::Arc;
use vidora_core::Config;
use vidora_storage::{create_storage, MediaStorage};

/// Create the configured storage backend
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn MediaStorage>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(backend = ?storage.backend_type(), "Storage backend initialized");

    Ok(storage)
}
