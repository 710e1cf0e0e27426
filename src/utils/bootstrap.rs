//! Bootstrap utilities for the pipeline binaries.
//!
//! Tracing setup and client construction shared by `booking-producer` and
//! `booking-consumer`. Configuration is checked before any client is built.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LOG_ENV_VAR, LOG_FORMAT_ENV_VAR};
use crate::error::PipelineError;
use crate::store::{init_object_store, ObjectStore};

#[cfg(feature = "sqs")]
use crate::queue::{MessageQueue, QueueAddress, SqsQueue};

/// Initialize tracing with the BOOKING_PIPELINE_LOG environment variable.
///
/// Defaults to "info" level if BOOKING_PIPELINE_LOG is not set. Set
/// BOOKING_PIPELINE_LOG_FORMAT=json for one JSON object per line.
///
/// Logs go to stderr; stdout carries only the invocation response.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var(LOG_FORMAT_ENV_VAR)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Build the SQS queue named by `queue.url`.
///
/// # Errors
///
/// Fails without touching AWS if the address is missing or malformed.
#[cfg(feature = "sqs")]
pub async fn connect_queue(config: &Config) -> Result<Arc<dyn MessageQueue>, PipelineError> {
    let address: QueueAddress = config.queue_address()?.parse()?;
    let queue = SqsQueue::new(
        address,
        config.aws.region.as_deref(),
        config.aws.endpoint_url.as_deref(),
    )
    .await;
    Ok(Arc::new(queue))
}

/// Build the configured object store, bound to `store.bucket`.
///
/// # Errors
///
/// Fails if the bucket is missing, or the store backend cannot be created.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn ObjectStore>, PipelineError> {
    let bucket = config.bucket()?;
    let store = init_object_store(&config.store, bucket, &config.aws).await?;
    Ok(store)
}
