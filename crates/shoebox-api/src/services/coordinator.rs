//! Upload coordination
//!
//! Decides, per request, whether an object already exists at the derived key (skip) or
//! a write capability has to be issued (ok). The service performs no logging; callers
//! get the derived key back in [`UploadOutcome`] and report it themselves.

use shoebox_core::{AppError, Capability, FileMetadata, UploadDecision};
use shoebox_storage::{derive_object_key, PutIntent, Storage, StorageError};
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

/// Result of a successful coordination step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub key: String,
    pub decision: UploadDecision,
}

#[derive(Clone)]
pub struct Coordinator {
    storage: Arc<dyn Storage>,
    key_prefix: String,
    capability_ttl: Duration,
}

impl Coordinator {
    pub fn new(storage: Arc<dyn Storage>, key_prefix: String, capability_ttl: Duration) -> Self {
        Coordinator {
            storage,
            key_prefix,
            capability_ttl,
        }
    }

    /// Decide skip-vs-upload for one file.
    ///
    /// Returns `InvalidInput` for metadata that cannot name an object, and `Storage` for
    /// any backend failure. A failed existence check is never reported as skip or ok.
    pub async fn request_upload(&self, meta: &FileMetadata) -> Result<UploadOutcome, AppError> {
        meta.validate()?;

        let key = derive_object_key(&self.key_prefix, meta);

        let exists = self
            .storage
            .exists(&key)
            .await
            .map_err(|e| storage_failure("existence check", &key, e))?;
        if exists {
            return Ok(UploadOutcome {
                key,
                decision: UploadDecision::Skip,
            });
        }

        let intent = PutIntent::for_file(meta);
        let presigned = self
            .storage
            .presigned_put(&key, &intent, self.capability_ttl)
            .await
            .map_err(|e| storage_failure("capability issuance", &key, e))?;

        Ok(UploadOutcome {
            key,
            decision: UploadDecision::Ok(Capability {
                url: presigned.url,
                method: presigned.method,
                headers: presigned.headers,
            }),
        })
    }
}

fn storage_failure(operation: &str, key: &str, err: StorageError) -> AppError {
    AppError::Storage(format!("{} failed for {}: {}", operation, key, err))
}
