//! Invocation-level errors.
//!
//! Everything here ends the current invocation. Per-message decode problems
//! are not errors; the consumer classifies them as `MessageOutcome::Malformed`.

use thiserror::Error;

use crate::config::ConfigError;
use crate::queue::QueueError;
use crate::store::StoreError;

/// Result type for producer and consumer invocations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Object store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to encode JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PipelineError {
    /// Status code reported at the invocation boundary.
    ///
    /// Upstream service failures map to 502; everything else to 500.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::Queue(_) | PipelineError::Store(_) => 502,
            PipelineError::Config(_) | PipelineError::Encode(_) => 500,
        }
    }
}
