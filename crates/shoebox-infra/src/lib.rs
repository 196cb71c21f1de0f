//! Shoebox Infrastructure Library
//!
//! Shared infrastructure for the coordinator service:
//! - Middleware (request ID, access log)
//! - Tracing initialization
//! - The error body every failed request renders

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod error;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{access_log_middleware, request_id_middleware, RequestId};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, LogFormat, TelemetryConfig};

pub use error::ErrorResponse;
