//! `POST /upload_request`: the skip-or-capability decision

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shoebox_core::{AppError, FileMetadata, UploadDecision};
use shoebox_infra::ErrorResponse;
use std::sync::Arc;

const BAD_REQUEST: &str = "bad request";

/// Ask whether a file must be uploaded
///
/// Answers 200 with a write capability when the derived key is absent, 409 with a
/// skip decision when it already exists.
#[utoipa::path(
    post,
    path = "/upload_request",
    tag = "uploads",
    request_body = FileMetadata,
    responses(
        (status = 200, description = "Object absent, capability issued", body = UploadDecision),
        (status = 409, description = "Object already stored", body = UploadDecision),
        (status = 400, description = "Malformed metadata", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 405, description = "Method other than POST", body = ErrorResponse),
        (status = 500, description = "Storage backend failure", body = ErrorResponse)
    ),
    security(("basic_auth" = []))
)]
pub async fn request_upload(
    State(state): State<Arc<AppState>>,
    method: Method,
    payload: Result<Json<FileMetadata>, JsonRejection>,
) -> Result<Response, HttpAppError> {
    if method != Method::POST {
        let mut response = HttpAppError(AppError::MethodNotAllowed(format!(
            "{} is not supported, use POST",
            method
        )))
        .into_response();
        response
            .headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("POST"));
        return Ok(response);
    }

    let Json(meta) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Failed to decode upload request");
        HttpAppError(AppError::BadRequest(BAD_REQUEST.to_string()))
    })?;

    let outcome = match state.coordinator.request_upload(&meta).await {
        Ok(outcome) => outcome,
        Err(AppError::InvalidInput(reason)) => {
            tracing::warn!(
                error = %reason,
                id = %meta.id,
                filename = %meta.name,
                "Rejected upload request metadata"
            );
            return Err(HttpAppError(AppError::BadRequest(BAD_REQUEST.to_string())));
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                id = %meta.id,
                filename = %meta.name,
                size = meta.size,
                content_type = %meta.content_type,
                mtime = %meta.mtime,
                test_upload = meta.test_upload,
                "Storage backend failure while handling upload request"
            );
            return Err(HttpAppError(e));
        }
    };

    let status = match outcome.decision {
        UploadDecision::Skip => {
            tracing::info!(
                id = %meta.id,
                filename = %meta.name,
                key = %outcome.key,
                size = meta.size,
                content_type = %meta.content_type,
                mtime = %meta.mtime,
                test_upload = meta.test_upload,
                "object_already_exists"
            );
            StatusCode::CONFLICT
        }
        _ => {
            tracing::info!(
                id = %meta.id,
                filename = %meta.name,
                key = %outcome.key,
                size = meta.size,
                content_type = %meta.content_type,
                mtime = %meta.mtime,
                test_upload = meta.test_upload,
                "upload_request_success"
            );
            StatusCode::OK
        }
    };

    Ok((status, Json(outcome.decision)).into_response())
}
