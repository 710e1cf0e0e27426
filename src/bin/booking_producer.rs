//! booking-producer: synthetic booking publisher
//!
//! Publishes one batch of random guest bookings to the configured queue,
//! one message per booking, then prints the invocation response.
//!
//! ## Architecture
//! ```text
//! [booking-producer] --(SendMessage x batch_size)--> [queue]
//! ```
//!
//! ## Configuration
//! - SQS_URL or SQS_ARN: queue address (required)
//! - BOOKING_PIPELINE__PRODUCER__BATCH_SIZE: bookings per run (default: 200)
//! - BOOKING_PIPELINE_CONFIG or first argument: YAML config file (optional)

use std::process::ExitCode;

use tracing::error;

use booking_pipeline::config::Config;
use booking_pipeline::error::Result;
use booking_pipeline::invocation::InvocationResponse;
use booking_pipeline::producer::{Producer, ProducerReport};
use booking_pipeline::utils::bootstrap::{connect_queue, init_tracing};

async fn run(config_path: Option<&str>) -> Result<ProducerReport> {
    let config = Config::load(config_path)?;
    let queue = connect_queue(&config).await?;
    Producer::new(queue, config.producer).run().await
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config_path = std::env::args().nth(1);
    let result = run(config_path.as_deref()).await;
    if let Err(e) = &result {
        error!(error = %e, "booking-producer failed");
    }

    let response = InvocationResponse::from_result(&result);
    println!("{}", response.to_json());

    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
