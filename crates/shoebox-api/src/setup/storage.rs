//! Storage setup and initialization

use anyhow::{Context, Result};
use shoebox_core::{CoordinatorConfig, StorageBackend};
use shoebox_storage::{create_storage, LocalStorage, Storage};
use std::sync::Arc;

/// Set up the object store. With the local backend the same instance also receives
/// capability writes, so it is returned a second time as the receiver.
pub async fn setup_storage(
    config: &CoordinatorConfig,
) -> Result<(Arc<dyn Storage>, Option<Arc<LocalStorage>>)> {
    tracing::info!(backend = %config.storage_backend, "Initializing storage...");

    let (storage, receiver): (Arc<dyn Storage>, Option<Arc<LocalStorage>>) =
        match config.storage_backend {
            StorageBackend::Local => {
                let local = Arc::new(local_storage(config).await?);
                (local.clone(), Some(local))
            }
            StorageBackend::S3 => (create_storage(config).await?, None),
        };

    tracing::info!(
        backend = ?storage.backend_type(),
        key_prefix = %config.key_prefix,
        "Storage initialized successfully"
    );

    Ok((storage, receiver))
}

async fn local_storage(config: &CoordinatorConfig) -> Result<LocalStorage> {
    let base_path = config
        .local_storage_path
        .clone()
        .context("LOCAL_STORAGE_PATH must be set when using the local storage backend")?;
    let base_url = config
        .local_storage_base_url
        .clone()
        .context("LOCAL_STORAGE_BASE_URL must be set when using the local storage backend")?;
    let signing_key = config
        .local_signing_key
        .clone()
        .context("LOCAL_SIGNING_KEY must be set when using the local storage backend")?;

    LocalStorage::new(base_path, base_url, signing_key)
        .await
        .context("Failed to initialize local storage")
}
