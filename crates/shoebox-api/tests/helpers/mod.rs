pub mod fixtures;

use axum_test::TestServer;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use shoebox_api::auth::BasicAuthState;
use shoebox_api::setup::{build_app, routes::setup_routes};
use shoebox_api::{AppState, Coordinator};
use shoebox_core::{CoordinatorConfig, StorageBackend};
use shoebox_storage::Storage;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const TEST_USERNAME: &str = "uploader";
pub const TEST_PASSWORD: &str = "correct horse battery staple";
pub const TEST_BASE_URL: &str = "http://coordinator.test";
pub const TEST_KEY_PREFIX: &str = "photos";

/// Test application backed by local storage in a temporary directory
pub struct TestApp {
    pub server: TestServer,
    pub storage_root: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Path of a stored object on disk
    pub fn object_path(&self, key: &str) -> PathBuf {
        self.storage_root.join("objects").join(key)
    }
}

/// Cost 4 keeps the tests fast; production hashes use the bcrypt default.
pub fn test_password_hash() -> String {
    bcrypt::hash(TEST_PASSWORD, 4).unwrap()
}

pub fn basic_auth(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", username, password))
    )
}

pub fn valid_auth() -> String {
    basic_auth(TEST_USERNAME, TEST_PASSWORD)
}

pub async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let storage_root = temp_dir.path().to_path_buf();

    let vars: HashMap<&str, String> = HashMap::from([
        ("BCRYPT_PASS", test_password_hash()),
        ("AUTH_USERNAME", TEST_USERNAME.to_string()),
        ("STORAGE_BACKEND", "local".to_string()),
        ("KEY_PREFIX", TEST_KEY_PREFIX.to_string()),
        (
            "LOCAL_STORAGE_PATH",
            storage_root.to_string_lossy().into_owned(),
        ),
        ("LOCAL_STORAGE_BASE_URL", TEST_BASE_URL.to_string()),
        ("LOCAL_SIGNING_KEY", "test-signing-key".to_string()),
    ]);
    let config = CoordinatorConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();

    let (_state, router) = build_app(&config).await.unwrap();

    TestApp {
        server: TestServer::new(router).unwrap(),
        storage_root,
        _temp_dir: temp_dir,
    }
}

/// Server over an arbitrary storage implementation, without the local object receiver
pub fn setup_test_server_with_storage(storage: Arc<dyn Storage>) -> TestServer {
    let state = Arc::new(AppState {
        coordinator: Coordinator::new(
            storage,
            TEST_KEY_PREFIX.to_string(),
            Duration::from_secs(60),
        ),
        auth: Arc::new(BasicAuthState::new(
            test_password_hash(),
            Some(TEST_USERNAME.to_string()),
        )),
        local_receiver: None,
        storage_backend: StorageBackend::S3,
        is_production: false,
    });

    TestServer::new(setup_routes(state)).unwrap()
}
