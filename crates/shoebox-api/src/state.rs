//! Application state shared by all handlers

use crate::auth::BasicAuthState;
use crate::services::coordinator::Coordinator;
use shoebox_core::StorageBackend;
use shoebox_storage::LocalStorage;
use std::sync::Arc;

pub struct AppState {
    pub coordinator: Coordinator,
    pub auth: Arc<BasicAuthState>,
    /// Present only with the local backend: this service then receives capability writes
    pub local_receiver: Option<Arc<LocalStorage>>,
    pub storage_backend: StorageBackend,
    /// Error responses carry details only when this is false
    pub is_production: bool,
}
