//! Amazon S3 object store.
//!
//! Objects land at `s3://{bucket}/{key}` with content type
//! `application/json`.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

use super::{validate_key, ObjectStore, Result, StoreError, StoredObject, JSON_CONTENT_TYPE};

/// S3-backed object store.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Create a new S3 object store.
    ///
    /// Uses default credentials from the environment (AWS_ACCESS_KEY_ID,
    /// AWS_SECRET_ACCESS_KEY, or IAM role).
    pub async fn new(bucket: impl Into<String>, region: Option<&str>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }
        let config = config_loader.load().await;

        Self::with_client(Client::new(&config), bucket)
    }

    /// Create with custom endpoint (for S3-compatible services like MinIO or LocalStack).
    pub async fn with_endpoint(
        bucket: impl Into<String>,
        endpoint: &str,
        region: Option<&str>,
    ) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }

        let config = config_loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .endpoint_url(endpoint)
            .force_path_style(true) // Required for MinIO and most S3-compatible services
            .build();

        Self::with_client(Client::from_conf(s3_config), bucket)
    }

    /// Create with explicit client (for testing).
    pub fn with_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    fn uri_for_key(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<StoredObject> {
        validate_key(key)?;
        let size = body.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(JSON_CONTENT_TYPE)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StoreError::PutFailed(format!("S3 upload failed: {}", e)))?;

        debug!(
            bucket = %self.bucket,
            key = %key,
            size = size,
            "Stored object in S3"
        );

        Ok(StoredObject {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            uri: self.uri_for_key(key),
            size,
        })
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
