//! # Temporal Types: UTC Timestamps and the Clock
//!
//! Defines `Timestamp`, a UTC-only instant truncated to millisecond
//! precision, and the [`Clock`] trait through which the rest of the stack
//! reads the current time.
//!
//! Milliseconds are the resolution of the certificate key derivation input
//! (epoch milliseconds), so a record's `created_at` and the instant hashed
//! into its key are representable by the same type without loss.
//!
//! Non-UTC inputs are rejected by [`Timestamp::parse()`]; the lenient parser
//! converts any offset to UTC for ingesting rows from external datastores.

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing or constructing a [`Timestamp`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// Strict parsing requires a `Z` suffix.
    #[error("timestamp must use Z suffix (UTC only), got: {0:?}")]
    NotUtc(String),

    /// Not valid RFC 3339.
    #[error("invalid RFC 3339 timestamp {input:?}: {reason}")]
    Invalid { input: String, reason: String },

    /// Epoch value outside the representable range.
    #[error("epoch milliseconds out of range: {0}")]
    OutOfRange(i64),
}

/// A UTC instant, truncated to milliseconds.
///
/// # Construction
///
/// - [`Timestamp::now()`]: current UTC time.
/// - [`Timestamp::from_utc()`]: from a `DateTime<Utc>`, truncating sub-millis.
/// - [`Timestamp::parse()`]: from an RFC 3339 string, rejecting non-UTC offsets.
/// - [`Timestamp::from_epoch_millis()`]: from Unix epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to milliseconds.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating sub-millis.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_millis(dt))
    }

    /// Parse an RFC 3339 timestamp. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, TimestampError> {
        if !s.ends_with('Z') {
            return Err(TimestampError::NotUtc(s.to_string()));
        }
        Self::parse_lenient(s)
    }

    /// Parse an RFC 3339 timestamp with any offset, converting to UTC.
    ///
    /// Datastores commonly render `timestamptz` as `+00:00`; this is the
    /// parser for reading those values back.
    pub fn parse_lenient(s: &str) -> Result<Self, TimestampError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| TimestampError::Invalid {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_utc(dt.with_timezone(&Utc)))
    }

    /// Create a timestamp from Unix epoch milliseconds.
    pub fn from_epoch_millis(millis: i64) -> Result<Self, TimestampError> {
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .ok_or(TimestampError::OutOfRange(millis))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch milliseconds.
    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// The UTC calendar date of this instant.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Render as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_lenient(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or(dt)
}

// -- Clock --------------------------------------------------------------------

/// Source of the current instant.
///
/// Implementations must be `Send + Sync` so a single clock can be shared
/// across request handlers behind an `Arc`.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;

    /// The current UTC calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that returns a settable instant. Used by tests and replay tooling.
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(instant: Timestamp) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    /// Replace the instant returned by subsequent calls.
    pub fn set(&self, instant: Timestamp) {
        *self.instant.lock() = instant;
    }

    /// Move the clock forward by `millis` milliseconds.
    pub fn advance_millis(&self, millis: i64) {
        let mut guard = self.instant.lock();
        *guard = Timestamp::from_utc(*guard.as_datetime() + chrono::Duration::milliseconds(millis));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.instant.lock()
    }
}
