//! Booking records.
//!
//! Two views of the same wire object:
//! - [`Booking`]: the full record the producer generates.
//! - [`BookingRecord`]: what the consumer needs. Every field, `startDate`
//!   and `endDate` included, is carried through untouched so the persisted
//!   output holds exactly what was received. The dates are also parsed to
//!   timestamps, which are used only to measure the stay.
//!
//! The producer writes ISO 8601 calendar dates (`YYYY-MM-DD`).

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Stays of this many days or fewer are filtered out.
pub const MAX_FILTERED_STAY_DAYS: i64 = 1;

const START_DATE_FIELD: &str = "startDate";
const END_DATE_FIELD: &str = "endDate";

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A synthetic guest booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub booking_id: String,
    pub user_id: String,
    pub property_id: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: String,
}

impl Booking {
    /// Length of the stay in whole days.
    pub fn stay_days(&self) -> i64 {
        self.end_date.signed_duration_since(self.start_date).num_days()
    }
}

/// Error decoding a message body into a [`BookingRecord`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed booking: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed booking: missing field `{0}`")]
    MissingField(&'static str),

    #[error("malformed booking: invalid `{field}`: {value}")]
    InvalidDate { field: &'static str, value: String },
}

/// Consumer-side view of a booking.
///
/// Serializes back to exactly the received object, in received order.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    /// `startDate`, as a UTC (or naive) timestamp.
    pub start: NaiveDateTime,
    /// `endDate`, as a UTC (or naive) timestamp.
    pub end: NaiveDateTime,
    /// The received object, verbatim.
    pub fields: Map<String, Value>,
}

impl BookingRecord {
    /// Decode a single JSON object from a message body.
    ///
    /// Fails if the body is not a JSON object, or lacks a parseable
    /// `startDate`/`endDate` string.
    pub fn decode(body: &[u8]) -> Result<Self, DecodeError> {
        let fields: Map<String, Value> = serde_json::from_slice(body)?;
        let start = date_field(&fields, START_DATE_FIELD)?;
        let end = date_field(&fields, END_DATE_FIELD)?;
        Ok(Self { start, end, fields })
    }

    /// Elapsed whole days from start to end, floored. Not validated: may be
    /// zero or negative if the sender put `endDate` first.
    pub fn stay_days(&self) -> i64 {
        self.end
            .signed_duration_since(self.start)
            .num_milliseconds()
            .div_euclid(MILLIS_PER_DAY)
    }

    /// Whether this booking passes the stay-duration filter.
    pub fn is_survivor(&self) -> bool {
        self.stay_days() > MAX_FILTERED_STAY_DAYS
    }

    /// `bookingId` if the sender included one, for logging.
    pub fn booking_id(&self) -> Option<&str> {
        self.fields.get("bookingId").and_then(Value::as_str)
    }
}

impl Serialize for BookingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

fn date_field(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<NaiveDateTime, DecodeError> {
    let value = fields.get(field).ok_or(DecodeError::MissingField(field))?;
    value
        .as_str()
        .and_then(timestamp::parse)
        .ok_or_else(|| DecodeError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

/// Lenient timestamp parsing for incoming date fields.
pub mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};

    const DATE_FORMAT: &str = "%Y-%m-%d";
    const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    /// Parse a date or timestamp string.
    ///
    /// A plain `YYYY-MM-DD` date is midnight. RFC 3339 timestamps are
    /// converted to UTC. Naive `YYYY-MM-DDTHH:MM:SS` timestamps are taken as is.
    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            return date.and_hms_opt(0, 0, 0);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.naive_utc());
        }
        NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }
}
