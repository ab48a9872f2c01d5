//! Payload validation for inbound webhooks.
//!
//! Validation is strict: all four fields must be present and coercible, and
//! unknown keys are rejected. Every violation is collected so a client sees
//! the full list in one response.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{Event, Timestamp};
use crate::error::WebhookError;

/// Field names accepted in an event payload, in declaration order.
pub const EVENT_FIELDS: [&str; 4] = ["event_id", "timestamp", "event_type", "description"];

/// Field path used when the payload as a whole has the wrong shape.
pub const ROOT_FIELD: &str = "$";

/// Category of a schema violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Missing,
    ExtraForbidden,
    ObjectType,
    IntType,
    IntParsing,
    StringType,
    StringTooShort,
    DatetimeType,
    DatetimeParsing,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Missing => "missing",
            ErrorKind::ExtraForbidden => "extra_forbidden",
            ErrorKind::ObjectType => "object_type",
            ErrorKind::IntType => "int_type",
            ErrorKind::IntParsing => "int_parsing",
            ErrorKind::StringType => "string_type",
            ErrorKind::StringTooShort => "string_too_short",
            ErrorKind::DatetimeType => "datetime_type",
            ErrorKind::DatetimeParsing => "datetime_parsing",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Offending field, or `$` for the payload root
    pub field: String,
    /// Machine-readable violation category
    pub kind: ErrorKind,
    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
        }
    }
}

/// All schema violations found in one payload. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} schema violation(s): {}", .0.len(), summarize(.0))]
pub struct ValidationErrors(Vec<FieldError>);

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} ({})", e.field, e.kind))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of the offending fields, in report order.
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

type Coerced<T> = Result<T, (ErrorKind, String)>;

/// Validate a decoded JSON value into an [`Event`].
pub fn validate_payload(value: &Value) -> Result<Event, ValidationErrors> {
    let Some(map) = value.as_object() else {
        return Err(ValidationErrors(vec![FieldError::new(
            ROOT_FIELD,
            ErrorKind::ObjectType,
            "input should be a JSON object",
        )]));
    };

    let mut errors = Vec::new();

    let event_id = field(map, "event_id", coerce_int, &mut errors);
    let timestamp = field(map, "timestamp", coerce_timestamp, &mut errors);
    let event_type = field(map, "event_type", coerce_non_empty_string, &mut errors);
    let description = field(map, "description", coerce_string, &mut errors);

    let mut extras: Vec<&str> = map
        .keys()
        .map(String::as_str)
        .filter(|key| !EVENT_FIELDS.contains(key))
        .collect();
    extras.sort_unstable();

    for key in extras {
        errors.push(FieldError::new(
            key,
            ErrorKind::ExtraForbidden,
            "extra inputs are not permitted",
        ));
    }

    match (event_id, timestamp, event_type, description) {
        (Some(event_id), Some(timestamp), Some(event_type), Some(description))
            if errors.is_empty() =>
        {
            Ok(Event::from_parts(event_id, timestamp, event_type, description))
        }
        _ => Err(ValidationErrors(errors)),
    }
}

/// Decode and validate a raw request body.
///
/// An empty body or invalid JSON is reported as malformed, separately from
/// schema violations.
pub fn parse_body(body: &[u8]) -> Result<Event, WebhookError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(WebhookError::Malformed(
            "request body must be a JSON object, got an empty body".to_string(),
        ));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| WebhookError::Malformed(format!("request body is not valid JSON: {}", e)))?;

    Ok(validate_payload(&value)?)
}

fn field<T>(
    map: &Map<String, Value>,
    name: &str,
    coerce: fn(&Value) -> Coerced<T>,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    let Some(value) = map.get(name) else {
        errors.push(FieldError::new(name, ErrorKind::Missing, "field required"));
        return None;
    };

    match coerce(value) {
        Ok(v) => Some(v),
        Err((kind, message)) => {
            errors.push(FieldError::new(name, kind, message));
            None
        }
    }
}

fn coerce_int(value: &Value) -> Coerced<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            let f = n.as_f64().unwrap_or(f64::NAN);
            if f.fract() != 0.0 {
                Err((
                    ErrorKind::IntParsing,
                    "input should be a valid integer, got a number with a fractional part"
                        .to_string(),
                ))
            } else if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Ok(f as i64)
            } else {
                Err((
                    ErrorKind::IntParsing,
                    "input should be an integer within the 64-bit signed range".to_string(),
                ))
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
            (
                ErrorKind::IntParsing,
                "input should be a valid integer, unable to parse string as an integer"
                    .to_string(),
            )
        }),
        Value::Bool(b) => Ok(i64::from(*b)),
        _ => Err((ErrorKind::IntType, "input should be a valid integer".to_string())),
    }
}

fn coerce_string(value: &Value) -> Coerced<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err((ErrorKind::StringType, "input should be a valid string".to_string())),
    }
}

fn coerce_non_empty_string(value: &Value) -> Coerced<String> {
    let s = coerce_string(value)?;
    if s.is_empty() {
        return Err((
            ErrorKind::StringTooShort,
            "string should have at least 1 character".to_string(),
        ));
    }
    Ok(s)
}

fn coerce_timestamp(value: &Value) -> Coerced<Timestamp> {
    match value {
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(secs) if secs.is_finite() => unix_timestamp(secs),
            _ => s.parse::<Timestamp>().map_err(|e| {
                (
                    ErrorKind::DatetimeParsing,
                    format!("input should be a valid datetime, {}", e),
                )
            }),
        },
        Value::Number(n) => unix_timestamp(n.as_f64().unwrap_or(f64::NAN)),
        _ => Err((
            ErrorKind::DatetimeType,
            "input should be a valid datetime".to_string(),
        )),
    }
}

fn unix_timestamp(secs: f64) -> Coerced<Timestamp> {
    Timestamp::from_unix(secs).ok_or_else(|| {
        (
            ErrorKind::DatetimeParsing,
            "input should be a valid datetime, Unix time out of range".to_string(),
        )
    })
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        validate_payload(&value).map_err(serde::de::Error::custom)
    }
}
