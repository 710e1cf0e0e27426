//! Blob storage for filtered output batches.
//!
//! ## Storage Backends
//!
//! - `S3ObjectStore` (feature: s3) - Amazon S3 or an S3-compatible service
//! - `FilesystemObjectStore` - Local directory, one subdirectory per bucket
//! - `MockObjectStore` - In-memory, for tests
//!
//! Each store is bound to one bucket when it is built. Writes never merge:
//! a `put` replaces whatever was at the key.

mod config;
mod filesystem;
mod mock;
#[cfg(feature = "s3")]
mod s3;

pub use config::{StoreConfig, StoreType};
pub use filesystem::FilesystemObjectStore;
pub use mock::MockObjectStore;
#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::AwsConfig;

/// Content type of every object this crate writes.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Errors that can occur during object store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to store object: {0}")]
    PutFailed(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store type not available in this build: {0}")]
    Unsupported(String),
}

/// Result type for object store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Where a `put` landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    /// Backend-specific URI (`s3://bucket/key`, `file:///...`, `mem://bucket/key`).
    pub uri: String,
    pub size: usize,
}

/// Key-addressed durable storage bound to one bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` as a new object at `key`.
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<StoredObject>;

    /// Bucket this store writes to.
    fn bucket(&self) -> &str;
}

// ============================================================================
// Factory
// ============================================================================

/// Initialize the configured object store, bound to `bucket`.
///
/// # Errors
///
/// Returns error if the configured store type requires an unavailable feature,
/// or the filesystem store cannot create its bucket directory.
pub async fn init_object_store(
    config: &StoreConfig,
    bucket: &str,
    aws: &AwsConfig,
) -> Result<Arc<dyn ObjectStore>> {
    match config.store_type {
        #[cfg(feature = "s3")]
        StoreType::S3 => {
            info!(
                bucket = %bucket,
                region = ?aws.region,
                endpoint = ?aws.endpoint_url,
                "ObjectStore: s3"
            );
            let store = match &aws.endpoint_url {
                Some(endpoint) => {
                    S3ObjectStore::with_endpoint(bucket, endpoint, aws.region.as_deref()).await
                }
                None => S3ObjectStore::new(bucket, aws.region.as_deref()).await,
            };
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "s3"))]
        StoreType::S3 => {
            let _ = aws;
            Err(StoreError::Unsupported(
                "s3 (rebuild with the `s3` feature)".to_string(),
            ))
        }
        StoreType::Filesystem => {
            info!(
                bucket = %bucket,
                path = %config.base_path.display(),
                "ObjectStore: filesystem"
            );
            let store = FilesystemObjectStore::new(&config.base_path, bucket).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Reject keys that are empty or would escape the bucket on a filesystem.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("empty key".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == ".." || segment.is_empty()) {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_filesystem_store() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            store_type: StoreType::Filesystem,
            bucket: Some("exports".to_string()),
            base_path: dir.path().to_path_buf(),
        };

        let store = init_object_store(&config, "exports", &AwsConfig::default())
            .await
            .unwrap();

        assert_eq!(store.bucket(), "exports");
        assert!(dir.path().join("exports").is_dir());
    }

    #[test]
    fn test_validate_key_accepts_nested() {
        assert!(validate_key("filtered_records_2024-01-01.json").is_ok());
        assert!(validate_key("exports/2024/filtered.json").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_bad_keys() {
        for key in ["", "/abs.json", "a/../b.json", "a//b.json", "trailing/"] {
            assert!(
                matches!(validate_key(key), Err(StoreError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }
}
