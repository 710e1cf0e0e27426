//! Batch-filter-persist consumer.
//!
//! One invocation makes one bounded pass over the queue:
//!
//! ```text
//! RECEIVING ──> for each message: DECODING ─> FILTERING ─> ACKNOWLEDGING
//!           └─> (if any survivors) PERSISTING ──> DONE
//! ```
//!
//! Each message is acknowledged as soon as it has been evaluated, before the
//! output object is written. A crash between the two loses the survivors of
//! that batch; delivery is at-most-once past the acknowledgment.

mod config;

pub use config::{ConsumerConfig, MalformedPolicy, OutputConfig};

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::booking::{BookingRecord, DecodeError};
use crate::error::Result;
use crate::queue::{MessageQueue, QueueMessage};
use crate::store::{ObjectStore, StoredObject};

/// How one message was classified.
#[derive(Debug)]
pub enum MessageOutcome {
    /// Stay longer than the threshold; goes to the output batch.
    Survivor(BookingRecord),
    /// Decoded fine but too short a stay.
    Filtered { duration: i64 },
    /// Body could not be decoded into a booking.
    Malformed(DecodeError),
}

impl MessageOutcome {
    /// Decode and filter one message body.
    pub fn evaluate(body: &[u8]) -> Self {
        match BookingRecord::decode(body) {
            Ok(record) if record.is_survivor() => MessageOutcome::Survivor(record),
            Ok(record) => MessageOutcome::Filtered {
                duration: record.stay_days(),
            },
            Err(e) => MessageOutcome::Malformed(e),
        }
    }
}

/// Summary of one consumer invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Messages returned by the receive call.
    pub received: usize,
    /// Records written to the output object.
    pub survivors: usize,
    /// Records dropped by the stay-duration filter.
    pub filtered: usize,
    /// Messages whose body could not be decoded.
    pub malformed: usize,
    /// Messages deleted from the queue.
    pub acknowledged: usize,
    /// Messages returned without an acknowledgment token. Left unprocessed
    /// for redelivery.
    pub unacknowledgeable: usize,
    /// Output object, if any record survived.
    pub object: Option<StoredObject>,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} messages processed.", self.received)?;
        if let Some(object) = &self.object {
            write!(
                f,
                " {} filtered records stored in {}.",
                self.survivors, object.uri
            )?;
        }
        Ok(())
    }
}

/// Drains one batch from a queue into one output object.
pub struct BatchConsumer {
    queue: Arc<dyn MessageQueue>,
    store: Arc<dyn ObjectStore>,
    config: ConsumerConfig,
    output: OutputConfig,
}

impl BatchConsumer {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        store: Arc<dyn ObjectStore>,
        config: ConsumerConfig,
        output: OutputConfig,
    ) -> Self {
        Self {
            queue,
            store,
            config,
            output,
        }
    }

    /// Run one receive-filter-acknowledge-persist pass.
    ///
    /// # Errors
    ///
    /// Any queue or store failure aborts the pass. Messages acknowledged
    /// before the failure stay acknowledged.
    pub async fn run_once(&self) -> Result<BatchReport> {
        info!(
            max_messages = self.config.batch_size(),
            wait_time_secs = self.config.wait_time().as_secs(),
            "Starting batch"
        );

        let messages = self
            .queue
            .receive(self.config.batch_size(), self.config.wait_time())
            .await?;
        info!(count = messages.len(), "Received batch");

        let mut report = BatchReport {
            received: messages.len(),
            ..BatchReport::default()
        };
        let mut survivors: Vec<BookingRecord> = Vec::new();

        for message in &messages {
            let Some(ack_token) = &message.ack_token else {
                warn!(
                    message_id = ?message.message_id,
                    "Message cannot be acknowledged; leaving it for redelivery"
                );
                report.unacknowledgeable += 1;
                continue;
            };

            let acknowledge = match MessageOutcome::evaluate(&message.body) {
                MessageOutcome::Survivor(record) => {
                    debug!(
                        message_id = ?message.message_id,
                        booking_id = ?record.booking_id(),
                        stay_days = record.stay_days(),
                        "Keeping booking"
                    );
                    survivors.push(record);
                    report.survivors += 1;
                    true
                }
                MessageOutcome::Filtered { duration } => {
                    debug!(
                        message_id = ?message.message_id,
                        duration = duration,
                        "Skipping booking of 1 day or less"
                    );
                    report.filtered += 1;
                    true
                }
                MessageOutcome::Malformed(e) => {
                    report.malformed += 1;
                    self.on_malformed(message, &e)
                }
            };

            if acknowledge {
                self.queue.acknowledge(ack_token).await?;
                report.acknowledged += 1;
            }
        }

        if !survivors.is_empty() {
            report.object = Some(self.persist(&survivors).await?);
        }

        info!(
            received = report.received,
            survivors = report.survivors,
            filtered = report.filtered,
            malformed = report.malformed,
            acknowledged = report.acknowledged,
            unacknowledgeable = report.unacknowledgeable,
            object = ?report.object.as_ref().map(|o| o.uri.as_str()),
            "Ending batch"
        );
        Ok(report)
    }

    /// Log a malformed message; returns whether to acknowledge it.
    fn on_malformed(&self, message: &QueueMessage, error: &DecodeError) -> bool {
        match self.config.malformed {
            MalformedPolicy::Acknowledge => {
                warn!(
                    message_id = ?message.message_id,
                    error = %error,
                    "Dropping malformed message"
                );
                true
            }
            MalformedPolicy::Retain => {
                warn!(
                    message_id = ?message.message_id,
                    error = %error,
                    "Leaving malformed message for redelivery"
                );
                false
            }
        }
    }

    async fn persist(&self, survivors: &[BookingRecord]) -> Result<StoredObject> {
        let body = serde_json::to_vec(survivors)?;
        let key = self.output.object_key(Utc::now(), Uuid::new_v4());
        let stored = self.store.put(&key, body).await?;
        info!(
            bucket = %stored.bucket,
            key = %stored.key,
            records = survivors.len(),
            size = stored.size,
            "Filtered records written"
        );
        Ok(stored)
    }
}
