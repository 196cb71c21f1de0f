mod helpers;

use helpers::fixtures::{metadata_for_body, perform_capability, FailingStorage};
use helpers::{setup_test_app, setup_test_server_with_storage, valid_auth};
use serde_json::{json, Value};
use std::sync::Arc;

async fn request_capability(app: &helpers::TestApp, meta: &Value) -> Value {
    let response = app
        .client()
        .post("/upload_request")
        .add_header("Authorization", valid_auth())
        .json(meta)
        .await;
    assert_eq!(response.status_code(), 200);
    response.json()
}

#[tokio::test]
async fn test_capability_write_stores_object() {
    let app = setup_test_app().await;
    let body = b"\xFF\xD8\xFFpretend jpeg".to_vec();
    let capability = request_capability(&app, &metadata_for_body("a.jpg", &body)).await;

    let response = perform_capability(app.client(), &capability, body.clone()).await;

    assert_eq!(response.status_code(), 200);
    let key = capability["url"]
        .as_str()
        .unwrap()
        .split("/objects/")
        .nth(1)
        .unwrap()
        .split('?')
        .next()
        .unwrap()
        .to_string();
    assert_eq!(std::fs::read(app.object_path(&key)).unwrap(), body);
}

#[tokio::test]
async fn test_tampered_signature_forbidden() {
    let app = setup_test_app().await;
    let body = b"payload".to_vec();
    let mut capability = request_capability(&app, &metadata_for_body("a.jpg", &body)).await;

    let url = capability["url"].as_str().unwrap().to_string();
    let (prefix, signature) = url.rsplit_once("signature=").unwrap();
    let flipped: String = signature
        .chars()
        .map(|c| if c == '0' { '1' } else { '0' })
        .collect();
    capability["url"] = json!(format!("{}signature={}", prefix, flipped));

    let response = perform_capability(app.client(), &capability, body).await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_altered_headers_forbidden() {
    let app = setup_test_app().await;
    let body = b"payload".to_vec();
    let mut capability = request_capability(&app, &metadata_for_body("a.jpg", &body)).await;

    capability["headers"]["x-meta-filename"] = json!("other.jpg");

    let response = perform_capability(app.client(), &capability, body).await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_missing_signature_forbidden() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .put("/objects/photos/x.jpg")
        .add_header("content-length", "3")
        .bytes("abc".into())
        .await;

    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_short_body_rejected() {
    let app = setup_test_app().await;
    let declared = b"ten bytes!".to_vec();
    let capability = request_capability(&app, &metadata_for_body("a.jpg", &declared)).await;

    // Signed for ten bytes, only three sent
    let response = perform_capability(app.client(), &capability, b"ten".to_vec()).await;
    assert_eq!(response.status_code(), 400);

    let retry = request_capability(&app, &metadata_for_body("a.jpg", &declared)).await;
    assert_eq!(retry["status"], "ok");
}

#[tokio::test]
async fn test_receiver_absent_without_local_backend() {
    let server = setup_test_server_with_storage(Arc::new(FailingStorage));

    let response = server
        .put("/objects/photos/x.jpg")
        .add_query_param("expires", 0)
        .add_query_param("signature", "00")
        .bytes("abc".into())
        .await;

    assert_eq!(response.status_code(), 404);
}
