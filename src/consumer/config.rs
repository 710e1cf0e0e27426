//! Consumer configuration.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::queue::{MAX_LONG_POLL, MAX_RECEIVE_BATCH};

/// What to do with a message whose body cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Drop it: acknowledge so it is never redelivered.
    #[default]
    Acknowledge,
    /// Leave it un-acknowledged; the queue redelivers it after the
    /// visibility timeout (and a redrive policy can dead-letter it).
    Retain,
}

/// Consumer batch settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Max number of messages to receive in one poll (default: 10, max: 10).
    pub max_messages: usize,
    /// Wait time seconds for long polling (default: 5, max: 20).
    pub wait_time_secs: u64,
    /// Handling of undecodable messages (default: acknowledge).
    pub malformed: MalformedPolicy,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_messages: MAX_RECEIVE_BATCH,
            wait_time_secs: 5,
            malformed: MalformedPolicy::default(),
        }
    }
}

impl ConsumerConfig {
    /// Batch size, clamped to what one receive can return.
    pub fn batch_size(&self) -> usize {
        self.max_messages.clamp(1, MAX_RECEIVE_BATCH)
    }

    /// Long-poll window, clamped to what one receive can request.
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs).min(MAX_LONG_POLL)
    }
}

/// Output object naming.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File name prefix (default: "filtered_records").
    pub key_prefix: String,
    /// Optional folder inside the bucket.
    pub folder: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            key_prefix: "filtered_records".to_string(),
            folder: None,
        }
    }
}

impl OutputConfig {
    /// Object key for one invocation's output.
    ///
    /// `{folder}/{prefix}_{UTC time to the millisecond}_{8 hex chars}.json`.
    /// The random suffix keeps two invocations in the same millisecond apart.
    pub fn object_key(&self, at: DateTime<Utc>, id: Uuid) -> String {
        let suffix = id.simple().to_string();
        let name = format!(
            "{}_{}_{}.json",
            self.key_prefix,
            at.format("%Y-%m-%dT%H-%M-%S%.3fZ"),
            &suffix[..8]
        );
        match self
            .folder
            .as_deref()
            .map(|f| f.trim().trim_matches('/'))
            .filter(|f| !f.is_empty())
        {
            Some(folder) => format!("{}/{}", folder, name),
            None => name,
        }
    }
}
