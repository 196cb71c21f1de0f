//! HTTP basic authentication gate
//!
//! The password is checked against a bcrypt hash; when a username is configured it must
//! match as well. Credentials are verified before the request body is touched.

use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use shoebox_core::AppError;
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub const BASIC_REALM: &str = "Basic realm=\"Restricted\"";

#[derive(Clone)]
pub struct BasicAuthState {
    pub password_hash: String,
    pub username: Option<String>,
}

impl BasicAuthState {
    pub fn new(password_hash: String, username: Option<String>) -> Self {
        BasicAuthState {
            password_hash,
            username,
        }
    }

    /// Check a username/password pair. bcrypt is CPU-bound, so it runs off the runtime.
    pub async fn verify(&self, username: &str, password: &str) -> bool {
        if let Some(ref expected) = self.username {
            if !secure_compare(username, expected) {
                return false;
            }
        }

        let hash = self.password_hash.clone();
        let password = password.to_string();
        match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await {
            Ok(Ok(valid)) => valid,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Stored password hash could not be used");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                false
            }
        }
    }
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Decode an `Authorization: Basic ...` value into its username and password.
pub fn parse_basic_credentials(value: &str) -> Option<(String, String)> {
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn unauthorized(reason: &str) -> Response {
    let mut response = HttpAppError(AppError::Unauthorized(reason.to_string())).into_response();
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_REALM));
    response
}

pub async fn basic_auth_middleware(
    State(auth_state): State<Arc<BasicAuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => return unauthorized("Missing authorization header"),
    };

    let (username, password) = match parse_basic_credentials(auth_header) {
        Some(credentials) => credentials,
        None => return unauthorized("Invalid authorization header format"),
    };

    if !auth_state.verify(&username, &password).await {
        return unauthorized("Invalid credentials");
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_credentials() {
        let header = format!("Basic {}", STANDARD.encode("alice:s3cr3t:with:colons"));
        assert_eq!(
            parse_basic_credentials(&header),
            Some(("alice".to_string(), "s3cr3t:with:colons".to_string()))
        );

        let lowercase = format!("basic {}", STANDARD.encode(":pw"));
        assert_eq!(
            parse_basic_credentials(&lowercase),
            Some((String::new(), "pw".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_other_schemes_and_garbage() {
        assert_eq!(parse_basic_credentials("Bearer abc"), None);
        assert_eq!(parse_basic_credentials("Basic !!!not-base64"), None);
        assert_eq!(
            parse_basic_credentials(&format!("Basic {}", STANDARD.encode("no-colon"))),
            None
        );
        assert_eq!(parse_basic_credentials(""), None);
    }

    #[tokio::test]
    async fn test_verify_password_and_optional_username() {
        let hash = bcrypt::hash("hunter2", 4).unwrap();

        let any_user = BasicAuthState::new(hash.clone(), None);
        assert!(any_user.verify("whoever", "hunter2").await);
        assert!(!any_user.verify("whoever", "hunter3").await);

        let named = BasicAuthState::new(hash, Some("uploader".to_string()));
        assert!(named.verify("uploader", "hunter2").await);
        assert!(!named.verify("someone", "hunter2").await);
    }

    #[tokio::test]
    async fn test_invalid_hash_never_authenticates() {
        let state = BasicAuthState::new("not-a-bcrypt-hash".to_string(), None);
        assert!(!state.verify("u", "").await);
    }
}
