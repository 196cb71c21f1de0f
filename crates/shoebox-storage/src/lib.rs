//! Shoebox Storage Library
//!
//! This crate provides the object store abstraction the coordinator consults: an
//! existence check plus issuance of presigned write capabilities. Backends never
//! receive file bytes through the coordinator; clients write directly with the
//! capability.
//!
//! # Storage key format
//!
//! Keys are derived from file metadata as `{prefix}/{timestamp}-{id}-{name}`, see the
//! `keys` module. Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::derive_object_key;
#[cfg(feature = "storage-local")]
pub use local::{LocalStorage, SignedPut};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use shoebox_core::StorageBackend;
pub use traits::{PresignedRequest, PutIntent, Storage, StorageError, StorageResult};
