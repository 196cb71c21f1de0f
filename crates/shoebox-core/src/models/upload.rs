use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Method used when a capability does not name one
pub const DEFAULT_CAPABILITY_METHOD: &str = "PUT";

/// Metadata the client submits for a single file it wants stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct FileMetadata {
    /// Hex digest of the exact bytes that will be transferred
    #[validate(custom(function = "validate_content_id"))]
    pub id: String,
    /// Display name (original filename)
    #[validate(custom(function = "validate_display_name"))]
    pub name: String,
    /// Capture time when known, otherwise the file modification time
    pub mtime: DateTime<Utc>,
    /// Byte length; must equal the number of bytes transferred
    pub size: u64,
    /// Sniffed MIME type
    #[validate(length(min = 1, message = "Content type must not be empty"))]
    pub content_type: String,
    /// Marks uploads that should not be treated as production data
    #[serde(default)]
    pub test_upload: bool,
}

fn validate_content_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("content_id");
        err.message = Some("Content identifier must be a non-empty alphanumeric digest".into());
        return Err(err);
    }
    Ok(())
}

fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        let mut err = ValidationError::new("display_name");
        err.message = Some("Name must be a plain file name".into());
        return Err(err);
    }
    Ok(())
}

/// A signed, time-limited permission to write one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Capability {
    pub url: String,
    #[serde(default)]
    pub method: String,
    /// Headers the client must send verbatim, keyed by lowercase name
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Capability {
    pub fn effective_method(&self) -> &str {
        if self.method.trim().is_empty() {
            DEFAULT_CAPABILITY_METHOD
        } else {
            self.method.as_str()
        }
    }
}

/// The coordinator's answer to an upload request
///
/// Serialized with a `status` tag so that every response body, including errors,
/// has the same shape on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadDecision {
    /// Upload needed; carries the write capability
    Ok(Capability),
    /// An object already exists at the derived key
    Skip,
    Error { error: String },
}
