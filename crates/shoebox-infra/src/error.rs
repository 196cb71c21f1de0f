//! HTTP error body
//!
//! IntoResponse for `AppError` lives in the API crate; this is only the wire shape. Any
//! body of this type also parses as a `status=error` upload decision.

use serde::Serialize;
use utoipa::ToSchema;

/// Error response body
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always "error"
    pub status: String,
    /// Client-safe message
    pub error: String,
    /// Error chain, only outside production and only for non-sensitive errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recoverable: Option<bool>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            error: error.into(),
            details: None,
            code: None,
            recoverable: None,
        }
    }

    pub fn with_code(mut self, code: &str, recoverable: bool) -> Self {
        self.code = Some(code.to_string());
        self.recoverable = Some(recoverable);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
