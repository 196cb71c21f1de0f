//! Local filesystem storage with HMAC-signed write capabilities.
//!
//! Objects live under `{base_path}/objects/{key}` and their attributes under
//! `{base_path}/attributes/{key}.json`. A capability is a URL of the form
//! `{base_url}/objects/{key}?expires={unix}&signature={hex}`; the signature covers the
//! method, key, expiry, content length, content type and every attribute header, so a
//! holder cannot change any of them.

use crate::traits::{PresignedRequest, PutIntent, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

/// Header prefix carrying object attributes on local capability writes
pub const ATTRIBUTE_HEADER_PREFIX: &str = "x-meta-";

const OBJECTS_DIR: &str = "objects";
const ATTRIBUTES_DIR: &str = "attributes";
const PUT_METHOD: &str = "PUT";

type HmacSha256 = Hmac<Sha256>;

/// A write arriving at the local object receiver, as extracted from the HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPut {
    pub key: String,
    pub expires: i64,
    pub signature: String,
    pub content_type: String,
    pub content_length: u64,
    /// Attribute headers with the `x-meta-` prefix stripped
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredAttributes {
    content_type: String,
    content_length: u64,
    attributes: BTreeMap<String, String>,
}

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signing_key: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for objects and attributes (e.g., "/var/lib/shoebox")
    /// * `base_url` - Externally reachable URL of the coordinator (e.g., "http://localhost:1234")
    /// * `signing_key` - Secret used to sign capabilities
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_key: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();
        let signing_key = signing_key.into();

        if signing_key.is_empty() {
            return Err(StorageError::ConfigError(
                "Local signing key must not be empty".to_string(),
            ));
        }

        for dir in [OBJECTS_DIR, ATTRIBUTES_DIR] {
            let path = base_path.join(dir);
            fs::create_dir_all(&path).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
            signing_key,
        })
    }

    /// Convert a storage key into a path below `dir`, rejecting anything that could
    /// escape it.
    fn key_to_path(&self, dir: &str, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.starts_with('/') || storage_key.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let relative = Path::new(storage_key);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(self.base_path.join(dir).join(relative))
    }

    fn object_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        self.key_to_path(OBJECTS_DIR, storage_key)
    }

    fn attributes_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        self.key_to_path(ATTRIBUTES_DIR, &format!("{}.json", storage_key))
    }

    fn object_url(&self, storage_key: &str) -> String {
        let encoded: Vec<String> = storage_key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}/{}", self.base_url, OBJECTS_DIR, encoded.join("/"))
    }

    fn sign(
        &self,
        storage_key: &str,
        expires: i64,
        content_length: u64,
        content_type: &str,
        attributes: &BTreeMap<String, String>,
    ) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        mac.update(
            canonical_request(storage_key, expires, content_length, content_type, attributes)
                .as_bytes(),
        );
        Ok(mac)
    }

    /// Check that a write matches the capability it claims to hold.
    pub fn verify(&self, put: &SignedPut) -> StorageResult<()> {
        if chrono::Utc::now().timestamp() > put.expires {
            return Err(StorageError::Forbidden("capability expired".to_string()));
        }

        let signature = hex::decode(&put.signature)
            .map_err(|_| StorageError::Forbidden("malformed signature".to_string()))?;

        self.sign(
            &put.key,
            put.expires,
            put.content_length,
            &put.content_type,
            &put.attributes,
        )?
        .verify_slice(&signature)
        .map_err(|_| StorageError::Forbidden("signature mismatch".to_string()))
    }

    /// Verify a capability write and store its body.
    ///
    /// The body must be exactly `content_length` bytes. Object and attributes are first
    /// written to temporary files and then renamed into place, attributes first, so an
    /// object is never visible without them.
    pub async fn accept_put(
        &self,
        put: &SignedPut,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    ) -> StorageResult<u64> {
        self.verify(put)?;

        let object_path = self.object_path(&put.key)?;
        let attributes_path = self.attributes_path(&put.key)?;
        ensure_parent_dir(&object_path).await?;
        ensure_parent_dir(&attributes_path).await?;

        let object_tmp = temp_sibling(&object_path);
        let received = match write_limited(&object_tmp, reader, put.content_length).await {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&object_tmp).await;
                return Err(e);
            }
        };

        if received != put.content_length {
            let _ = fs::remove_file(&object_tmp).await;
            return Err(StorageError::LengthMismatch {
                expected: put.content_length,
                actual: received,
            });
        }

        let stored = StoredAttributes {
            content_type: put.content_type.clone(),
            content_length: put.content_length,
            attributes: put.attributes.clone(),
        };
        let json = serde_json::to_vec_pretty(&stored)
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        let attributes_tmp = temp_sibling(&attributes_path);
        fs::write(&attributes_tmp, json).await?;
        fs::rename(&attributes_tmp, &attributes_path).await?;
        fs::rename(&object_tmp, &object_path).await?;

        tracing::info!(
            key = %put.key,
            size_bytes = received,
            "Local object stored"
        );

        Ok(received)
    }
}

/// The string covered by a local capability signature.
fn canonical_request(
    storage_key: &str,
    expires: i64,
    content_length: u64,
    content_type: &str,
    attributes: &BTreeMap<String, String>,
) -> String {
    let mut canonical = format!(
        "{}\n{}\n{}\n{}\n{}\n",
        PUT_METHOD, storage_key, expires, content_length, content_type
    );
    for (name, value) in attributes {
        canonical.push_str(&format!("{}{}:{}\n", ATTRIBUTE_HEADER_PREFIX, name, value));
    }
    canonical
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
}

async fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// Copy at most `expected + 1` bytes so an oversized body is detected without
/// buffering all of it.
async fn write_limited(
    path: &Path,
    reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
    expected: u64,
) -> StorageResult<u64> {
    let mut file = fs::File::create(path).await.map_err(|e| {
        StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
    })?;

    let mut limited = reader.take(expected.saturating_add(1));
    let written = tokio::io::copy(&mut limited, &mut file)
        .await
        .map_err(|e| StorageError::UploadFailed(format!("Failed to receive body: {}", e)))?;

    file.flush().await?;
    file.sync_all().await.map_err(|e| {
        StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
    })?;

    Ok(written)
}

#[async_trait]
impl Storage for LocalStorage {
    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.object_path(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn presigned_put(
        &self,
        storage_key: &str,
        intent: &PutIntent,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        // Validate the key before handing out a URL for it
        self.object_path(storage_key)?;

        let expires = chrono::Utc::now().timestamp() + expires_in.as_secs().max(1) as i64;
        let signature = hex::encode(
            self.sign(
                storage_key,
                expires,
                intent.content_length,
                &intent.content_type,
                &intent.attributes,
            )?
            .finalize()
            .into_bytes(),
        );

        let mut headers = BTreeMap::new();
        headers.insert(
            "content-length".to_string(),
            intent.content_length.to_string(),
        );
        headers.insert("content-type".to_string(), intent.content_type.clone());
        for (name, value) in &intent.attributes {
            headers.insert(format!("{}{}", ATTRIBUTE_HEADER_PREFIX, name), value.clone());
        }

        Ok(PresignedRequest {
            url: format!(
                "{}?expires={}&signature={}",
                self.object_url(storage_key),
                expires,
                signature
            ),
            method: PUT_METHOD.to_string(),
            headers,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
