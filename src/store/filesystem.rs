//! Filesystem-based object storage.
//!
//! Stores objects as files in a directory structure:
//! ```text
//! {base_path}/
//!   {bucket}/
//!     {key}
//! ```
//!
//! Keys containing `/` become nested directories.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use super::{validate_key, ObjectStore, Result, StoredObject};

/// Filesystem-based object store for local runs.
pub struct FilesystemObjectStore {
    base_path: PathBuf,
    bucket: String,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store.
    ///
    /// Creates `{base_path}/{bucket}` if it doesn't exist.
    pub async fn new(base_path: impl AsRef<Path>, bucket: impl Into<String>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        let bucket = bucket.into();
        fs::create_dir_all(base_path.join(&bucket)).await?;
        Ok(Self { base_path, bucket })
    }

    /// File path for a key.
    pub fn path_for_key(&self, key: &str) -> PathBuf {
        self.base_path.join(&self.bucket).join(key)
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<StoredObject> {
        validate_key(key)?;
        let path = self.path_for_key(key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically using temp file + rename
        let mut temp_name = path.as_os_str().to_os_string();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        fs::write(&temp_path, &body).await?;
        if let Err(e) = fs::rename(&temp_path, &path).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                warn!(path = %temp_path.display(), error = %cleanup, "Failed to remove temp file");
            }
            return Err(e.into());
        }

        debug!(path = %path.display(), size = body.len(), "Stored object");

        Ok(StoredObject {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            uri: format!("file://{}", path.display()),
            size: body.len(),
        })
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
