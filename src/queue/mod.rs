//! Message queue interface.
//!
//! This module contains:
//! - `MessageQueue` trait: publish, long-poll receive, acknowledge
//! - `QueueMessage` / `AckToken`: what a receive hands back
//! - Implementations: SQS (feature `sqs`), in-memory mock
//!
//! Delivery is at-least-once. A received message stays invisible until its
//! visibility timeout expires; acknowledging it deletes it for good.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

pub mod mock;
#[cfg(feature = "sqs")]
pub mod sqs;

pub use mock::MockQueue;
#[cfg(feature = "sqs")]
pub use sqs::{QueueAddress, SqsQueue};

/// Most messages a single receive may return (the SQS limit).
pub const MAX_RECEIVE_BATCH: usize = 10;

/// Longest long-poll wait a single receive may request (the SQS limit).
pub const MAX_LONG_POLL: Duration = Duration::from_secs(20);

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors that can occur during queue operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Invalid queue address: {0}")]
    InvalidAddress(String),

    #[error("Failed to resolve queue: {0}")]
    Resolve(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Acknowledge failed: {0}")]
    Acknowledge(String),
}

/// Opaque token confirming receipt of one message (SQS receipt handle).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AckToken(String);

impl AckToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AckToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message handed out by [`MessageQueue::receive`].
#[derive(Debug, Clone)]
pub struct QueueMessage {
    /// Service-assigned id, if any. Only used for logging.
    pub message_id: Option<String>,
    /// Raw message body.
    pub body: Vec<u8>,
    /// Token to pass to [`MessageQueue::acknowledge`]. `None` if the service
    /// handed the message out without one; it cannot be deleted and will be
    /// redelivered.
    pub ack_token: Option<AckToken>,
}

/// Interface to a managed message queue.
///
/// Implementations:
/// - `SqsQueue`: AWS SQS
/// - `MockQueue`: In-memory queue for testing
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Publish one message. Returns the service-assigned message id, if any.
    async fn publish(&self, body: &[u8]) -> Result<Option<String>>;

    /// Receive up to `max_messages` with a single long-poll request.
    ///
    /// Returns as soon as messages are available, or with an empty batch
    /// once `wait` has elapsed. Never blocks past `wait`.
    async fn receive(&self, max_messages: usize, wait: Duration) -> Result<Vec<QueueMessage>>;

    /// Confirm processing and remove the message from the queue.
    async fn acknowledge(&self, token: &AckToken) -> Result<()>;
}
