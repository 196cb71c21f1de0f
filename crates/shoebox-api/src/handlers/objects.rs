//! `PUT /objects/{*key}`: receiver for local-backend capabilities
//!
//! Only mounted when the local backend is configured. Requests carry no credentials; the
//! signed query string is the only authorization.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures::TryStreamExt;
use serde::Deserialize;
use shoebox_core::AppError;
use shoebox_storage::local::ATTRIBUTE_HEADER_PREFIX;
use shoebox_storage::SignedPut;
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use tokio_util::io::StreamReader;

#[derive(Debug, Deserialize)]
pub struct CapabilityQuery {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

pub async fn put_object(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<CapabilityQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, HttpAppError> {
    let receiver = state
        .local_receiver
        .as_ref()
        .ok_or_else(|| AppError::NotFound("object receiver is not enabled".to_string()))?;

    let (expires, signature) = match (query.expires, query.signature) {
        (Some(expires), Some(signature)) => (expires, signature),
        _ => {
            return Err(AppError::Forbidden("missing capability signature".to_string()).into());
        }
    };

    let content_length = header_str(&headers, header::CONTENT_LENGTH.as_str())
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| AppError::BadRequest("Content-Length header is required".to_string()))?;

    let content_type = header_str(&headers, header::CONTENT_TYPE.as_str())
        .unwrap_or_default()
        .to_string();

    let put = SignedPut {
        key,
        expires,
        signature,
        content_type,
        content_length,
        attributes: attribute_headers(&headers),
    };

    let stream = body.into_data_stream().map_err(io::Error::other);
    let reader = StreamReader::new(stream);

    receiver.accept_put(&put, Box::pin(reader)).await?;

    Ok(StatusCode::OK)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Collect `x-meta-*` headers, keyed by the suffix.
fn attribute_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let suffix = name.as_str().strip_prefix(ATTRIBUTE_HEADER_PREFIX)?;
            let value = value.to_str().ok()?;
            Some((suffix.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_attribute_headers_strip_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert("x-meta-filename", HeaderValue::from_static("a.jpg"));
        headers.insert("x-meta-test-upload", HeaderValue::from_static("true"));
        headers.insert("content-type", HeaderValue::from_static("image/jpeg"));

        let attributes = attribute_headers(&headers);
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes["filename"], "a.jpg");
        assert_eq!(attributes["test-upload"], "true");
    }
}
