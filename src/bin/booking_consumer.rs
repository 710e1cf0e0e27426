//! booking-consumer: batch filter
//!
//! Receives one batch from the configured queue, keeps bookings longer than
//! one day and writes them as a single JSON array to the object store.
//!
//! ## Architecture
//! ```text
//! [queue] --(ReceiveMessage)--> [booking-consumer] --(PutObject)--> [bucket]
//!                                      |
//!                                      +--(DeleteMessage per message)--> [queue]
//! ```
//!
//! ## Configuration
//! - SQS_URL or SQS_ARN: queue address (required)
//! - target_bucket_name: output bucket (required)
//! - BOOKING_PIPELINE__STORE__TYPE: s3 | filesystem (default: s3)
//! - BOOKING_PIPELINE_CONFIG or first argument: YAML config file (optional)

use std::process::ExitCode;

use tracing::error;

use booking_pipeline::config::Config;
use booking_pipeline::consumer::{BatchConsumer, BatchReport};
use booking_pipeline::error::Result;
use booking_pipeline::invocation::InvocationResponse;
use booking_pipeline::utils::bootstrap::{connect_queue, connect_store, init_tracing};

async fn run(config_path: Option<&str>) -> Result<BatchReport> {
    let config = Config::load(config_path)?;
    // Both required settings are checked before the first queue call.
    config.queue_address()?;
    config.bucket()?;

    let queue = connect_queue(&config).await?;
    let store = connect_store(&config).await?;

    BatchConsumer::new(queue, store, config.consumer, config.output)
        .run_once()
        .await
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config_path = std::env::args().nth(1);
    let result = run(config_path.as_deref()).await;
    if let Err(e) = &result {
        error!(error = %e, "booking-consumer failed");
    }

    let response = InvocationResponse::from_result(&result);
    println!("{}", response.to_json());

    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
