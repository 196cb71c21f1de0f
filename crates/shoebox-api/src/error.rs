//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Every error renders as an
//! [`ErrorResponse`] with `status = "error"`, so a failed request still decodes as an
//! upload decision on the client side.
//!
//! Responses leave the handler without details. Outside production,
//! [`error_details_middleware`] re-renders them with the error chain.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use shoebox_core::{AppError, ErrorMetadata, LogLevel};
use shoebox_infra::ErrorResponse;
use shoebox_storage::StorageError;
use std::sync::Arc;

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rule: neither IntoResponse nor AppError is defined in this crate)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::Forbidden(msg) => AppError::Forbidden(msg),
            StorageError::InvalidKey(msg) => AppError::BadRequest(format!("invalid key: {}", msg)),
            err @ StorageError::LengthMismatch { .. } => AppError::BadRequest(err.to_string()),
            StorageError::UploadFailed(msg) => AppError::Storage(msg),
            StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        };
        HttpAppError(app)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Request failed");
        }
    }
}

/// The error a response was rendered from
#[derive(Clone)]
struct RenderedError(Arc<AppError>);

/// Build the response body for an error.
///
/// Details are included only outside production and only for non-sensitive errors.
pub fn error_body(app_error: &AppError, is_production: bool) -> ErrorResponse {
    let body = ErrorResponse::new(app_error.client_message())
        .with_code(app_error.error_code(), app_error.is_recoverable());

    if is_production || app_error.is_sensitive() {
        body
    } else {
        body.with_details(app_error.detailed_message())
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let mut response = (status, Json(error_body(app_error, true))).into_response();
        response
            .extensions_mut()
            .insert(RenderedError(Arc::new(self.0)));
        response
    }
}

/// Add error details to error responses when not running in production.
pub async fn error_details_middleware(
    State(is_production): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if is_production {
        return response;
    }

    let Some(RenderedError(app_error)) = response.extensions().get::<RenderedError>().cloned()
    else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    match serde_json::to_vec(&error_body(&app_error, false)) {
        Ok(json) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(json))
        }
        Err(_) => Response::from_parts(parts, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_error_hides_details() {
        let err = AppError::Storage("HeadObject: dispatch failure".to_string());
        let body = serde_json::to_value(error_body(&err, false)).unwrap();

        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Failed to access storage");
        assert_eq!(body["code"], "STORAGE_ERROR");
        assert!(body.get("details").is_none());
    }

    #[test]
    fn test_details_only_outside_production() {
        let err = AppError::BadRequest("bad request".to_string());

        let dev = serde_json::to_value(error_body(&err, false)).unwrap();
        assert_eq!(dev["error"], "bad request");
        assert!(dev["details"].as_str().unwrap().contains("bad request"));

        let prod = serde_json::to_value(error_body(&err, true)).unwrap();
        assert!(prod.get("details").is_none());
    }

    #[test]
    fn test_storage_error_mapping() {
        let forbidden = HttpAppError::from(StorageError::Forbidden("signature mismatch".into()));
        assert_eq!(forbidden.0.http_status_code(), 403);

        let short = HttpAppError::from(StorageError::LengthMismatch {
            expected: 10,
            actual: 3,
        });
        assert_eq!(short.0.http_status_code(), 400);

        let backend = HttpAppError::from(StorageError::BackendError("timeout".into()));
        assert_eq!(backend.0.http_status_code(), 500);
        assert_eq!(backend.0.client_message(), "Failed to access storage");
    }

    #[test]
    fn test_into_response_status() {
        let response =
            HttpAppError(AppError::MethodNotAllowed("use POST".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    fn failing_app(is_production: bool) -> axum::Router {
        async fn fail() -> Result<(), HttpAppError> {
            Err(AppError::BadRequest("missing field `size`".to_string()).into())
        }

        axum::Router::new()
            .route("/", axum::routing::get(fail))
            .layer(axum::middleware::from_fn_with_state(
                is_production,
                error_details_middleware,
            ))
    }

    #[tokio::test]
    async fn test_details_follow_configured_environment() {
        let dev = axum_test::TestServer::new(failing_app(false)).unwrap();
        let response = dev.get("/").await;
        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "error");
        assert!(body["details"]
            .as_str()
            .unwrap()
            .contains("missing field `size`"));

        let prod = axum_test::TestServer::new(failing_app(true)).unwrap();
        let response = prod.get("/").await;
        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_details_never_added_for_sensitive_errors() {
        async fn fail() -> Result<(), HttpAppError> {
            Err(AppError::Storage("HeadObject: dispatch failure".to_string()).into())
        }
        let app = axum::Router::new()
            .route("/", axum::routing::get(fail))
            .layer(axum::middleware::from_fn_with_state(
                false,
                error_details_middleware,
            ));

        let server = axum_test::TestServer::new(app).unwrap();
        let body: serde_json::Value = server.get("/").await.json();
        assert!(body.get("details").is_none());
        assert!(!body.to_string().contains("dispatch failure"));
    }
}
