//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::{Context, Result};
use shoebox_core::{CoordinatorConfig, StorageBackend};
use std::net::SocketAddr;

/// Validate critical configuration values
///
/// Fails fast on anything that would only surface on the first request: an unusable
/// password hash, an unparsable bind address, a missing backend setting.
pub fn validate_config(config: &CoordinatorConfig) -> Result<()> {
    config.validate()?;

    // A hash bcrypt cannot parse would reject every client
    bcrypt::verify("", &config.password_hash)
        .context("BCRYPT_PASS is not a valid bcrypt hash")?;

    config
        .listen_addr
        .parse::<SocketAddr>()
        .with_context(|| format!("LISTEN_ADDR is not a socket address: {}", config.listen_addr))?;

    if config.is_production() {
        if config.storage_backend == StorageBackend::Local {
            tracing::warn!(
                "Local storage backend in production - objects live on this host only"
            );
        }
        if config.auth_username.is_none() {
            tracing::warn!("AUTH_USERNAME not set - any username is accepted with the password");
        }
        if config
            .local_storage_base_url
            .as_deref()
            .is_some_and(|url| url.starts_with("http://"))
        {
            tracing::warn!("LOCAL_STORAGE_BASE_URL is not https - capabilities travel in clear text");
        }
    }

    Ok(())
}
