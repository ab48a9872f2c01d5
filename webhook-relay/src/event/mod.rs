//! Event model and payload validation.
//!
//! ## Flow
//!
//! ```text
//! request body → parse_body() → validate_payload() → Event
//! ```

pub mod types;
pub mod validate;

pub use types::{Event, InvalidTimestamp, Timestamp};
pub use validate::{
    parse_body, validate_payload, ErrorKind, FieldError, ValidationErrors, EVENT_FIELDS,
    ROOT_FIELD,
};
