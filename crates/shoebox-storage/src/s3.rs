use crate::traits::{PresignedRequest, PutIntent, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::{RetryConfig, RetryMode};
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Header prefix S3 uses for user metadata
const METADATA_HEADER_PREFIX: &str = "x-amz-meta-";

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        if bucket.is_empty() {
            return Err(StorageError::ConfigError("S3 bucket name is empty".to_string()));
        }

        let region_provider = RegionProviderChain::first_try(aws_config::Region::new(region));

        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_retry_mode(RetryMode::Standard);

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .retry_config(retry_config.clone())
            .load()
            .await;

        let client = if let Some(ref endpoint) = endpoint_url {
            let mut s3_config_builder = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .endpoint_url(endpoint)
                .region(config.region().cloned())
                .retry_config(retry_config);
            if let Some(provider) = config.credentials_provider() {
                s3_config_builder = s3_config_builder.credentials_provider(provider);
            }
            // MinIO and friends need path-style addressing
            s3_config_builder = s3_config_builder.force_path_style(true);

            Client::from_conf(s3_config_builder.build())
        } else {
            Client::new(&config)
        };

        tracing::info!(bucket = %bucket, endpoint = ?endpoint_url, "S3 storage initialized");

        Ok(S3Storage { client, bucket })
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    HeadObjectError::NotFound(_) => Ok(false),
                    _ => Err(StorageError::BackendError(e.to_string())),
                },
                _ => Err(StorageError::BackendError(e.to_string())),
            },
        }
    }

    async fn presigned_put(
        &self,
        storage_key: &str,
        intent: &PutIntent,
        expires_in: Duration,
    ) -> StorageResult<PresignedRequest> {
        let presigning_config = PresigningConfig::builder()
            .expires_in(expires_in)
            .build()
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        let content_length = i64::try_from(intent.content_length).map_err(|_| {
            StorageError::BackendError(format!(
                "Content length {} exceeds S3 limits",
                intent.content_length
            ))
        })?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .content_length(content_length)
            .content_type(&intent.content_type);
        for (name, value) in &intent.attributes {
            request = request.metadata(name, value);
        }

        let presigned = request.presigned(presigning_config).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                "S3 presign failed"
            );
            StorageError::BackendError(e.to_string())
        })?;

        // The client must replay every header that went into the signature.
        let mut headers = BTreeMap::new();
        headers.insert(
            "content-length".to_string(),
            intent.content_length.to_string(),
        );
        headers.insert("content-type".to_string(), intent.content_type.clone());
        for (name, value) in &intent.attributes {
            headers.insert(format!("{}{}", METADATA_HEADER_PREFIX, name), value.clone());
        }
        for (name, value) in presigned.headers() {
            headers.insert(name.to_ascii_lowercase(), value.to_string());
        }

        Ok(PresignedRequest {
            url: presigned.uri().to_string(),
            method: presigned.method().to_string(),
            headers,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
