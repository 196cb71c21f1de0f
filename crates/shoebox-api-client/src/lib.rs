//! HTTP client for the Shoebox coordinator.
//!
//! Two kinds of calls leave the client: the authenticated upload request to the
//! coordinator, and the unauthenticated capability transfer to whatever URL the
//! coordinator handed out. Both live behind the [`UploadGateway`] trait so the batch
//! runner can be driven without a network.

pub mod transfer;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shoebox_core::{Capability, FileMetadata, UploadDecision};
use std::sync::Arc;
use std::time::Duration;

pub const UPLOAD_REQUEST_PATH: &str = "/upload_request";

/// Deadline for a whole coordinator call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authentication strategy for the coordinator.
#[derive(Clone)]
pub enum Auth {
    /// `Authorization: Basic base64(username:password)`
    Basic { username: String, password: String },
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Network side of an upload: ask the coordinator, then perform the granted write.
#[async_trait]
pub trait UploadGateway: Send + Sync {
    /// Ask the coordinator what to do with a file.
    async fn request_upload(&self, meta: &FileMetadata) -> Result<UploadDecision>;

    /// Stream exactly `size` bytes of `file` to the capability URL.
    async fn transfer(
        &self,
        capability: &Capability,
        file: tokio::fs::File,
        size: u64,
    ) -> Result<()>;
}

#[async_trait]
impl<T: UploadGateway + ?Sized> UploadGateway for Arc<T> {
    async fn request_upload(&self, meta: &FileMetadata) -> Result<UploadDecision> {
        (**self).request_upload(meta).await
    }

    async fn transfer(
        &self,
        capability: &Capability,
        file: tokio::fs::File,
        size: u64,
    ) -> Result<()> {
        (**self).transfer(capability, file, size).await
    }
}

/// HTTP client for the coordinator with basic auth.
///
/// Coordinator calls are bounded by a request timeout. Transfers only bound the
/// connect phase: a large file may take any time to send, and the capability's own
/// expiry is enforced by the store.
#[derive(Clone, Debug)]
pub struct CoordinatorClient {
    client: Client,
    transfer_client: Client,
    base_url: String,
    auth: Auth,
}

impl CoordinatorClient {
    pub fn new(base_url: String, auth: Auth) -> Result<Self> {
        Self::with_request_timeout(base_url, auth, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_request_timeout(
        base_url: String,
        auth: Auth,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let transfer_client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to create transfer HTTP client")?;

        Ok(Self {
            client,
            transfer_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }
}

#[async_trait]
impl UploadGateway for CoordinatorClient {
    async fn request_upload(&self, meta: &FileMetadata) -> Result<UploadDecision> {
        let url = self.build_url(UPLOAD_REQUEST_PATH);
        let request = self.apply_auth(self.client.post(&url).json(meta));

        let response = request
            .send()
            .await
            .context("Failed to send upload request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read upload request response")?;

        decode_decision(status, &body)
    }

    async fn transfer(
        &self,
        capability: &Capability,
        file: tokio::fs::File,
        size: u64,
    ) -> Result<()> {
        transfer::put_capability(&self.transfer_client, capability, file, size).await
    }
}

/// Interpret a coordinator response.
///
/// 200 carries a decision in the body. 409 means skip, with or without a body. Anything
/// else is an error; a body describing the failure is included in the message.
pub fn decode_decision(status: StatusCode, body: &str) -> Result<UploadDecision> {
    match status {
        StatusCode::OK => {
            let decision: UploadDecision = serde_json::from_str(body)
                .context("Failed to parse upload decision as JSON")?;
            match decision {
                UploadDecision::Error { error } => {
                    Err(anyhow::anyhow!("Coordinator reported an error: {}", error))
                }
                decision => Ok(decision),
            }
        }
        StatusCode::CONFLICT => match serde_json::from_str::<UploadDecision>(body) {
            Ok(UploadDecision::Ok(_)) => Err(anyhow::anyhow!(
                "Coordinator answered 409 with an upload capability"
            )),
            Ok(UploadDecision::Error { error }) => {
                Err(anyhow::anyhow!("Coordinator reported an error: {}", error))
            }
            // Empty or unparsable 409 bodies still mean skip
            _ => Ok(UploadDecision::Skip),
        },
        _ => {
            let message = match serde_json::from_str::<UploadDecision>(body) {
                Ok(UploadDecision::Error { error }) => error,
                _ if body.trim().is_empty() => "no response body".to_string(),
                _ => body.trim().to_string(),
            };
            Err(anyhow::anyhow!(
                "Upload request failed with status {}: {}",
                status,
                message
            ))
        }
    }
}
