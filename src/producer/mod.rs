//! Synthetic booking producer.
//!
//! Generates a fixed-size batch of random bookings and publishes each one as
//! its own queue message. There is no rollback: if a publish fails, the
//! bookings already sent stay on the queue.

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::booking::Booking;
use crate::error::Result;
use crate::queue::MessageQueue;

/// Bookings published per invocation unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Locations bookings are drawn from.
pub const CANADIAN_CITIES: [&str; 11] = [
    "Toronto",
    "Montreal",
    "Vancouver",
    "Calgary",
    "Edmonton",
    "Ottawa",
    "Winnipeg",
    "Quebec City",
    "Halifax",
    "Victoria",
    "Saskatoon",
];

const START_WINDOW_FIRST: NaiveDate = match NaiveDate::from_ymd_opt(2023, 11, 30) {
    Some(date) => date,
    None => panic!("invalid start window"),
};
const START_WINDOW_LAST: NaiveDate = match NaiveDate::from_ymd_opt(2024, 3, 31) {
    Some(date) => date,
    None => panic!("invalid start window"),
};

const MIN_STAY_DAYS: i64 = 1;
const MAX_STAY_DAYS: i64 = 14;
const MIN_PRICE_USD: u32 = 50;
const MAX_PRICE_USD: u32 = 500;

/// Producer settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Bookings per invocation (default: 200).
    pub batch_size: usize,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Random booking source.
pub struct BookingGenerator<R = StdRng> {
    rng: R,
}

impl BookingGenerator<StdRng> {
    /// Generator seeded from the OS.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl Default for BookingGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> BookingGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// One random booking.
    ///
    /// Start date falls in 2023-11-30..=2024-03-31, the stay lasts 1 to 14
    /// days and the price is 50 to 500 USD.
    pub fn generate(&mut self) -> Booking {
        let window = START_WINDOW_LAST
            .signed_duration_since(START_WINDOW_FIRST)
            .num_days();
        let start_date = START_WINDOW_FIRST + Duration::days(self.rng.random_range(0..=window));
        let end_date =
            start_date + Duration::days(self.rng.random_range(MIN_STAY_DAYS..=MAX_STAY_DAYS));

        let city = CANADIAN_CITIES[self.rng.random_range(0..CANADIAN_CITIES.len())];

        Booking {
            booking_id: self.booking_id().to_string(),
            user_id: format!("UserID-{}", self.rng.random_range(1000..=9999)),
            property_id: format!("PropertyID-{}", self.rng.random_range(100..=999)),
            location: format!("{}, Canada", city),
            start_date,
            end_date,
            price: format!(
                "{} USD",
                self.rng.random_range(MIN_PRICE_USD..=MAX_PRICE_USD)
            ),
        }
    }

    /// Random v4 UUID drawn from this generator's RNG.
    fn booking_id(&mut self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

/// Summary of one producer invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerReport {
    pub published: usize,
}

impl fmt::Display for ProducerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} guest bookings published to queue", self.published)
    }
}

/// Publishes generated bookings to a queue.
pub struct Producer<R = StdRng> {
    queue: Arc<dyn MessageQueue>,
    generator: BookingGenerator<R>,
    config: ProducerConfig,
}

impl Producer<StdRng> {
    pub fn new(queue: Arc<dyn MessageQueue>, config: ProducerConfig) -> Self {
        Self::with_generator(queue, BookingGenerator::new(), config)
    }
}

impl<R: Rng> Producer<R> {
    pub fn with_generator(
        queue: Arc<dyn MessageQueue>,
        generator: BookingGenerator<R>,
        config: ProducerConfig,
    ) -> Self {
        Self {
            queue,
            generator,
            config,
        }
    }

    /// Generate and publish one batch.
    ///
    /// # Errors
    ///
    /// Stops at the first failed publish or encode.
    pub async fn run(&mut self) -> Result<ProducerReport> {
        let batch_size = self.config.batch_size;
        info!(batch_size, "Publishing bookings");

        let mut published = 0;
        for _ in 0..batch_size {
            let booking = self.generator.generate();
            let body = serde_json::to_vec(&booking)?;

            match self.queue.publish(&body).await {
                Ok(message_id) => {
                    debug!(
                        booking_id = %booking.booking_id,
                        message_id = ?message_id,
                        location = %booking.location,
                        stay_days = booking.stay_days(),
                        "Booking published"
                    );
                    published += 1;
                }
                Err(e) => {
                    error!(
                        published,
                        batch_size,
                        error = %e,
                        "Publish failed; bookings already sent stay on the queue"
                    );
                    return Err(e.into());
                }
            }
        }

        info!(published, "Bookings published");
        Ok(ProducerReport { published })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingRecord;
    use crate::error::PipelineError;
    use crate::queue::MockQueue;
    use std::collections::HashSet;
    use std::time::Duration as StdDuration;

    fn seeded(seed: u64) -> BookingGenerator<StdRng> {
        BookingGenerator::with_rng(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_generated_bookings_stay_in_range() {
        let mut generator = seeded(7);
        for _ in 0..500 {
            let booking = generator.generate();
            assert!(booking.start_date >= START_WINDOW_FIRST);
            assert!(booking.start_date <= START_WINDOW_LAST);
            assert!((MIN_STAY_DAYS..=MAX_STAY_DAYS).contains(&booking.stay_days()));

            let user: u32 = booking.user_id.strip_prefix("UserID-").unwrap().parse().unwrap();
            assert!((1000..=9999).contains(&user));
            let property: u32 = booking
                .property_id
                .strip_prefix("PropertyID-")
                .unwrap()
                .parse()
                .unwrap();
            assert!((100..=999).contains(&property));

            let price: u32 = booking.price.strip_suffix(" USD").unwrap().parse().unwrap();
            assert!((MIN_PRICE_USD..=MAX_PRICE_USD).contains(&price));

            let city = booking.location.strip_suffix(", Canada").unwrap();
            assert!(CANADIAN_CITIES.contains(&city));
        }
    }

    #[test]
    fn test_booking_ids_are_unique_v4() {
        let mut generator = seeded(11);
        let ids: HashSet<String> = (0..1000).map(|_| generator.generate().booking_id).collect();
        assert_eq!(ids.len(), 1000);
        for id in ids.iter().take(10) {
            assert_eq!(Uuid::parse_str(id).unwrap().get_version_num(), 4);
        }
    }

    #[test]
    fn test_same_seed_same_bookings() {
        assert_eq!(seeded(42).generate(), seeded(42).generate());
    }

    #[test]
    fn test_generated_booking_decodes_on_consumer_side() {
        let booking = seeded(3).generate();
        let body = serde_json::to_vec(&booking).unwrap();
        let record = BookingRecord::decode(&body).unwrap();
        assert_eq!(record.stay_days(), booking.stay_days());
        assert_eq!(record.booking_id(), Some(booking.booking_id.as_str()));
    }

    #[tokio::test]
    async fn test_run_publishes_batch() {
        let queue = Arc::new(MockQueue::new());
        let mut producer = Producer::with_generator(
            queue.clone(),
            seeded(1),
            ProducerConfig { batch_size: 25 },
        );

        let report = producer.run().await.unwrap();

        assert_eq!(report.published, 25);
        assert_eq!(report.to_string(), "25 guest bookings published to queue");
        assert_eq!(queue.published_count().await, 25);
    }

    #[tokio::test]
    async fn test_run_default_batch_size() {
        let queue = Arc::new(MockQueue::new());
        let mut producer = Producer::new(queue.clone(), ProducerConfig::default());

        producer.run().await.unwrap();

        assert_eq!(queue.pending_count().await, DEFAULT_BATCH_SIZE);
        let messages = queue.receive(10, StdDuration::ZERO).await.unwrap();
        for message in messages {
            let booking: Booking = serde_json::from_slice(&message.body).unwrap();
            assert!(booking.end_date > booking.start_date);
        }
    }

    #[tokio::test]
    async fn test_publish_failure_is_terminal() {
        let queue = Arc::new(MockQueue::new());
        queue.set_fail_on_publish(true).await;
        let mut producer = Producer::with_generator(
            queue.clone(),
            seeded(1),
            ProducerConfig { batch_size: 5 },
        );

        let result = producer.run().await;

        assert!(matches!(result, Err(PipelineError::Queue(_))));
        assert_eq!(queue.published_count().await, 0);
    }
}
