use async_trait::async_trait;
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};
use shoebox_core::StorageBackend;
use shoebox_storage::{PresignedRequest, PutIntent, Storage, StorageError, StorageResult};
use std::time::Duration;

use super::TEST_BASE_URL;

/// Metadata for a 500 KB JPEG captured at 2020-01-01T00:00:00Z
pub fn sample_metadata() -> Value {
    json!({
        "id": "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08",
        "name": "a.jpg",
        "mtime": "2020-01-01T00:00:00Z",
        "size": 512000,
        "content_type": "image/jpeg",
        "test_upload": false
    })
}

pub const SAMPLE_KEY: &str =
    "photos/2020-01-01-00_00_00-9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08-a.jpg";

/// Metadata whose size matches `body`
pub fn metadata_for_body(name: &str, body: &[u8]) -> Value {
    let mut meta = sample_metadata();
    meta["name"] = json!(name);
    meta["size"] = json!(body.len());
    meta
}

/// Perform the write a capability describes, against the in-process server.
pub async fn perform_capability(
    server: &TestServer,
    capability: &Value,
    body: Vec<u8>,
) -> TestResponse {
    let url = capability["url"].as_str().unwrap();
    let path_and_query = url.strip_prefix(TEST_BASE_URL).unwrap();
    let (path, query) = path_and_query.split_once('?').unwrap();

    let mut request = server.put(path);
    for pair in query.split('&') {
        let (name, value) = pair.split_once('=').unwrap();
        request = request.add_query_param(name, value);
    }
    for (name, value) in capability["headers"].as_object().unwrap() {
        request = request.add_header(name.clone(), value.as_str().unwrap().to_string());
    }

    request.bytes(body.into()).await
}

/// Store whose every operation fails, as an unreachable backend would
pub struct FailingStorage;

#[async_trait]
impl Storage for FailingStorage {
    async fn exists(&self, _storage_key: &str) -> StorageResult<bool> {
        Err(StorageError::BackendError(
            "dispatch failure: connection refused".to_string(),
        ))
    }

    async fn presigned_put(
        &self,
        _storage_key: &str,
        _intent: &PutIntent,
        _expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        Err(StorageError::BackendError("unreachable".to_string()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
