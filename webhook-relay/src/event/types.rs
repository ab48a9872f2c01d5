//! Event and timestamp types.
//!
//! An [`Event`] is only ever produced by the validator, so every instance
//! in the system is known to satisfy the schema.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, SubsecRound, Timelike, Utc,
};
use serde::{Serialize, Serializer};
use thiserror::Error;

use super::validate::{ErrorKind, FieldError, ValidationErrors};

/// Unix timestamps larger than this are interpreted as milliseconds.
const MILLIS_THRESHOLD: f64 = 2e10;

/// Formats accepted for timestamps that carry a UTC offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Formats accepted for timestamps without an offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Timestamp string that could not be parsed as ISO-8601.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid ISO-8601 datetime: {input:?}")]
pub struct InvalidTimestamp {
    input: String,
}

/// Point in time attached to an event.
///
/// Keeps whether the input carried a UTC offset so the canonical form
/// renders the same shape back. Precision is microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Local time without an offset, e.g. `2023-10-05T12:34:56`
    Naive(NaiveDateTime),
    /// Time with an explicit offset, e.g. `2023-10-05T12:34:56+00:00`
    Offset(DateTime<FixedOffset>),
}

impl Timestamp {
    /// Build a UTC timestamp from Unix seconds.
    ///
    /// Values beyond 2e10 are taken as milliseconds.
    pub fn from_unix(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }

        let secs = if value.abs() > MILLIS_THRESHOLD {
            value / 1000.0
        } else {
            value
        };

        let mut whole = secs.floor();
        let mut micros = ((secs - whole) * 1_000_000.0).round() as u32;
        if micros >= 1_000_000 {
            whole += 1.0;
            micros = 0;
        }

        if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
            return None;
        }

        DateTime::<Utc>::from_timestamp(whole as i64, micros * 1000)
            .map(|dt| Timestamp::Offset(dt.with_timezone(&Utc.fix())))
    }

    /// Whether the timestamp carries an explicit offset.
    pub fn has_offset(&self) -> bool {
        matches!(self, Timestamp::Offset(_))
    }
}

impl FromStr for Timestamp {
    type Err = InvalidTimestamp;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Timestamp::Offset(dt.trunc_subsecs(6)));
        }

        let with_offset = match raw.strip_suffix(['Z', 'z']) {
            Some(prefix) => format!("{}+00:00", prefix),
            None => raw.to_string(),
        };

        for format in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(&with_offset, format) {
                return Ok(Timestamp::Offset(dt.trunc_subsecs(6)));
            }
        }

        for format in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(Timestamp::Naive(dt.trunc_subsecs(6)));
            }
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Timestamp::Naive)
            .ok_or_else(|| InvalidTimestamp {
                input: raw.to_string(),
            })
    }
}

fn naive_format(nanos: u32) -> &'static str {
    if nanos == 0 {
        "%Y-%m-%dT%H:%M:%S"
    } else {
        "%Y-%m-%dT%H:%M:%S%.6f"
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Naive(dt) => write!(f, "{}", dt.format(naive_format(dt.nanosecond()))),
            Timestamp::Offset(dt) => write!(
                f,
                "{}{}",
                dt.naive_local().format(naive_format(dt.nanosecond())),
                dt.format("%:z")
            ),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A validated webhook event.
///
/// Immutable once constructed. Serializes to the canonical JSON form with
/// the timestamp rendered as ISO-8601 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    event_id: i64,
    timestamp: Timestamp,
    event_type: String,
    description: String,
}

impl Event {
    /// Create an event from already-typed parts.
    ///
    /// Applies the same constraints as payload validation.
    pub fn new(
        event_id: i64,
        timestamp: Timestamp,
        event_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ValidationErrors> {
        let event_type = event_type.into();
        if event_type.is_empty() {
            return Err(ValidationErrors::from(vec![FieldError::new(
                "event_type",
                ErrorKind::StringTooShort,
                "string should have at least 1 character",
            )]));
        }

        Ok(Self::from_parts(event_id, timestamp, event_type, description.into()))
    }

    pub(crate) fn from_parts(
        event_id: i64,
        timestamp: Timestamp,
        event_type: String,
        description: String,
    ) -> Self {
        Self {
            event_id,
            timestamp,
            event_type,
            description,
        }
    }

    pub fn event_id(&self) -> i64 {
        self.event_id
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
