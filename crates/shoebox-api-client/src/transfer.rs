//! Capability transfers
//!
//! The capability is followed literally: its method, its URL and every header it lists.
//! No coordinator credentials are attached.

use anyhow::{Context, Result};
use reqwest::{header::HeaderName, header::HeaderValue, Body, Client, Method, StatusCode};
use shoebox_core::Capability;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

/// Stream exactly `size` bytes from the current position of `file` to the capability.
///
/// Only HTTP 200 counts as success; the response body of any other status is carried
/// in the error for diagnostics.
pub async fn put_capability(
    client: &Client,
    capability: &Capability,
    file: tokio::fs::File,
    size: u64,
) -> Result<()> {
    let method = Method::from_bytes(capability.effective_method().as_bytes())
        .with_context(|| format!("Invalid capability method: {}", capability.method))?;

    let mut request = client.request(method, &capability.url);
    for (name, value) in &capability.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("Invalid capability header name: {}", name))?;
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("Invalid value for capability header {}", name))?;
        request = request.header(name, value);
    }

    let stream = ReaderStream::new(file.take(size));
    let response = request
        .body(Body::wrap_stream(stream))
        .send()
        .await
        .context("Failed to send file to capability URL")?;

    let status = response.status();
    if status != StatusCode::OK {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(anyhow::anyhow!(
            "Transfer failed with status {}: {}",
            status,
            error_text
        ));
    }

    tracing::debug!(url = %strip_query(&capability.url), size, "Transfer complete");
    Ok(())
}

/// Capability URLs carry their signature in the query; keep it out of logs.
fn strip_query(url: &str) -> &str {
    url.split_once('?').map(|(base, _)| base).unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tokio::io::AsyncSeekExt;

    async fn file_with(contents: &[u8]) -> (tempfile::TempDir, tokio::fs::File) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, contents).unwrap();
        let file = tokio::fs::File::open(&path).await.unwrap();
        (dir, file)
    }

    fn capability(url: String, size: usize) -> Capability {
        Capability {
            url,
            method: String::new(),
            headers: BTreeMap::from([
                ("content-length".to_string(), size.to_string()),
                ("content-type".to_string(), "image/jpeg".to_string()),
                ("x-amz-meta-filename".to_string(), "a.jpg".to_string()),
            ]),
        }
    }

    #[tokio::test]
    async fn test_transfer_uses_capability_method_headers_and_exact_bytes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/bucket/key")
            .match_query(mockito::Matcher::UrlEncoded("sig".into(), "abc".into()))
            .match_header("content-type", "image/jpeg")
            .match_header("x-amz-meta-filename", "a.jpg")
            .match_header("authorization", mockito::Matcher::Missing)
            .match_body("hello")
            .with_status(200)
            .create_async()
            .await;

        let (_dir, file) = file_with(b"hello").await;
        let client = Client::new();
        put_capability(
            &client,
            &capability(format!("{}/bucket/key?sig=abc", server.url()), 5),
            file,
            5,
        )
        .await
        .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_transfer_starts_at_current_position() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/k")
            .match_body("hello")
            .with_status(200)
            .create_async()
            .await;

        let (_dir, mut file) = file_with(b"hello").await;
        // Simulate a prior full read, then reposition as the batch runner does
        let mut sink = Vec::new();
        file.read_to_end(&mut sink).await.unwrap();
        file.seek(std::io::SeekFrom::Start(0)).await.unwrap();

        put_capability(&Client::new(), &capability(format!("{}/k", server.url()), 5), file, 5)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_200_is_error_with_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/k")
            .with_status(403)
            .with_body("<Error><Code>AccessDenied</Code><Message>Request has expired</Message></Error>")
            .create_async()
            .await;

        let (_dir, file) = file_with(b"hello").await;
        let err = put_capability(&Client::new(), &capability(format!("{}/k", server.url()), 5), file, 5)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("403"));
        assert!(message.contains("Request has expired"));
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("http://s/k?signature=abc"), "http://s/k");
        assert_eq!(strip_query("http://s/k"), "http://s/k");
    }
}
