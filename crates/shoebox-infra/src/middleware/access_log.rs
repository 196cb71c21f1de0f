use super::request_id::RequestId;
use axum::http::header::CONTENT_LENGTH;
use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// One structured event per request: method, path, protocol, status, size and duration.
///
/// Must be layered inside `request_id_middleware` to pick up the request ID.
pub async fn access_log_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().path().to_string();
    let version = request.version();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let size = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    tracing::info!(
        method = %method,
        uri = %uri,
        proto = ?version,
        status = status,
        size = ?size,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        request_id = %request_id,
        "request completed"
    );

    response
}
