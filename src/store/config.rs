//! Object store configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Object store type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// Amazon S3 (requires `s3` feature).
    #[default]
    S3,
    /// Local directory, one subdirectory per bucket.
    Filesystem,
}

/// Object store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store type.
    #[serde(rename = "type")]
    pub store_type: StoreType,

    /// Target bucket. Required; no default.
    pub bucket: Option<String>,

    /// Root directory for the filesystem store.
    pub base_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            bucket: None,
            base_path: PathBuf::from("./data/objects"),
        }
    }
}
