//! Booking pipeline.
//!
//! A producer publishes synthetic guest bookings to a message queue; a
//! consumer drains the queue in bounded batches, keeps bookings longer than
//! one day and writes each batch's survivors as one JSON object to a blob
//! store.
//!
//! ```text
//! [booking-producer] --> (queue) --> [booking-consumer] --> (object store)
//! ```

pub mod booking;
pub mod config;
pub mod consumer;
pub mod error;
pub mod invocation;
pub mod producer;
pub mod queue;
pub mod store;
pub mod utils;
