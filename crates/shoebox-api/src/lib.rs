//! Shoebox Coordinator API
//!
//! HTTP front end of the upload coordinator: authenticates clients, answers upload
//! requests with skip or a signed write capability, and (for the local backend)
//! receives capability writes itself.

mod api_doc;
mod handlers;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use error::HttpAppError;
pub use services::coordinator::{Coordinator, UploadOutcome};
pub use state::AppState;
