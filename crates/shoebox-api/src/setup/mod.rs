//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::auth::BasicAuthState;
use crate::services::coordinator::Coordinator;
use crate::state::AppState;
use anyhow::{Context, Result};
use shoebox_core::CoordinatorConfig;
use shoebox_infra::{init_telemetry, TelemetryConfig};
use std::sync::Arc;

const DEFAULT_LOG_FILTER: &str = "shoebox=info,shoebox_api=info,shoebox_storage=info,tower_http=info";

/// Initialize the entire application: configuration checks, tracing, storage, routes.
pub async fn initialize_app(config: CoordinatorConfig) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    init_telemetry(&TelemetryConfig::from_env("shoebox-api", DEFAULT_LOG_FILTER))
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        backend = %config.storage_backend,
        "Configuration loaded and validated successfully"
    );

    build_app(&config).await
}

/// Build state and router without touching global tracing state.
pub async fn build_app(config: &CoordinatorConfig) -> Result<(Arc<AppState>, axum::Router)> {
    let (storage, local_receiver) = storage::setup_storage(config).await?;

    let state = Arc::new(AppState {
        coordinator: Coordinator::new(
            storage,
            config.key_prefix.clone(),
            config.capability_ttl,
        ),
        auth: Arc::new(BasicAuthState::new(
            config.password_hash.clone(),
            config.auth_username.clone(),
        )),
        local_receiver,
        storage_backend: config.storage_backend,
        is_production: config.is_production(),
    });

    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
