//! Shoebox Core Library
//!
//! This crate provides the wire models exchanged between the upload client and the
//! coordinator, the unified error type, and coordinator configuration. Every other
//! Shoebox crate depends on it.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::CoordinatorConfig;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Capability, FileMetadata, MediaKind, UploadDecision};
pub use storage_types::StorageBackend;
