//! Configuration module
//!
//! The coordinator is configured once at start-up from the process environment (plus an
//! optional `.env` file). The resulting `CoordinatorConfig` is immutable and handed to
//! each component at construction; nothing reads the environment after start-up.

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:1234";
const DEFAULT_REGION: &str = "us-east-1";
const CAPABILITY_TTL_SECS: u64 = 60;

/// Coordinator configuration
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    pub listen_addr: String,
    pub environment: String,
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: String,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub key_prefix: String,
    /// bcrypt hash of the shared upload password
    pub password_hash: String,
    /// When set, the basic-auth username must match as well
    pub auth_username: Option<String>,
    pub capability_ttl: Duration,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_signing_key: Option<String>,
}

impl CoordinatorConfig {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let capability_ttl_secs = lookup("CAPABILITY_TTL_SECS")
            .unwrap_or_else(|| CAPABILITY_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("CAPABILITY_TTL_SECS must be a whole number of seconds"))?;

        let config = CoordinatorConfig {
            listen_addr: lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            environment: lookup("ENVIRONMENT")
                .or_else(|| lookup("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            storage_backend,
            s3_bucket: lookup("S3_BUCKET"),
            s3_region: lookup("S3_REGION")
                .or_else(|| lookup("AWS_REGION"))
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            s3_endpoint: lookup("S3_ENDPOINT"),
            key_prefix: lookup("KEY_PREFIX").unwrap_or_default(),
            password_hash: lookup("BCRYPT_PASS")
                .ok_or_else(|| anyhow::anyhow!("BCRYPT_PASS must be set for authentication"))?,
            auth_username: lookup("AUTH_USERNAME").filter(|s| !s.is_empty()),
            capability_ttl: Duration::from_secs(capability_ttl_secs),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL"),
            local_signing_key: lookup("LOCAL_SIGNING_KEY"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that every setting the selected backend needs is present.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.capability_ttl.is_zero() {
            return Err(anyhow::anyhow!("CAPABILITY_TTL_SECS must be greater than zero"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.as_deref().unwrap_or("").is_empty() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            StorageBackend::Local => {
                for (name, value) in [
                    ("LOCAL_STORAGE_PATH", &self.local_storage_path),
                    ("LOCAL_STORAGE_BASE_URL", &self.local_storage_base_url),
                    ("LOCAL_SIGNING_KEY", &self.local_signing_key),
                ] {
                    if value.as_deref().unwrap_or("").is_empty() {
                        return Err(anyhow::anyhow!(
                            "{} must be set when STORAGE_BACKEND=local",
                            name
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Check if the coordinator is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
