//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use shoebox_core::FileMetadata;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Attribute holding the original file name, percent-encoded
pub const ATTR_FILENAME: &str = "filename";
/// Attribute holding the original mtime (RFC 3339, UTC)
pub const ATTR_MTIME: &str = "mtime";
/// Attribute present (as "true") only on non-production uploads
pub const ATTR_TEST_UPLOAD: &str = "test-upload";

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Capability rejected: {0}")]
    Forbidden(String),

    #[error("Content length mismatch: expected {expected} bytes, received {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// What a capability holder is allowed to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutIntent {
    pub content_type: String,
    pub content_length: u64,
    /// Store-side attributes; names are unprefixed (`filename`, `mtime`, `test-upload`)
    pub attributes: BTreeMap<String, String>,
}

impl PutIntent {
    /// Build the write scope for a file: exact length, exact type, and its attributes.
    ///
    /// Attribute values travel as HTTP headers, which only carry ASCII, so the file
    /// name is percent-encoded.
    pub fn for_file(meta: &FileMetadata) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            ATTR_FILENAME.to_string(),
            urlencoding::encode(&meta.name).into_owned(),
        );
        attributes.insert(
            ATTR_MTIME.to_string(),
            meta.mtime
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        );
        if meta.test_upload {
            attributes.insert(ATTR_TEST_UPLOAD.to_string(), "true".to_string());
        }

        PutIntent {
            content_type: meta.content_type.clone(),
            content_length: meta.size,
            attributes,
        }
    }
}

/// A signed request the client replays verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedRequest {
    pub url: String,
    pub method: String,
    /// Lowercase header names mapped to the exact values to send
    pub headers: BTreeMap<String, String>,
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait. The
/// coordinator only ever checks for existence and mints write capabilities; it never
/// writes object bytes itself.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Check if an object exists at the key
    ///
    /// Only a definite "not found" from the backend yields `Ok(false)`. Any other
    /// failure is an error so callers never mistake an outage for absence.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Generate a presigned write for exactly one object at `storage_key`.
    ///
    /// The returned headers pin the content length, content type and attributes;
    /// the write is rejected by the store if any of them differ.
    async fn presigned_put(
        &self,
        storage_key: &str,
        intent: &PutIntent,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
