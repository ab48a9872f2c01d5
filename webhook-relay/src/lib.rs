//! Webhook Relay - minimal webhook receiver with alert forwarding.
//!
//! This library provides the pieces behind the `webhook-relay` binary:
//! - `event`: event model and strict payload validation
//! - `sink`: in-memory, ordered store of accepted events
//! - `forward`: outbound alert POSTs to customer endpoints
//! - `web`: HTTP routes and error-to-status mapping
//!
//! ## Architecture
//!
//! ```text
//! POST /webhook → parse_body() → EventSink::record() → 200 {event_id}
//!                                       │
//!                     (ALERT_TARGET_URL) └→ Forwarder::spawn_alert()
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod forward;
pub mod sink;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::WebhookError;
pub use event::{parse_body, validate_payload, Event, FieldError, Timestamp, ValidationErrors};
pub use forward::{ForwardError, ForwardResponse, Forwarder};
pub use sink::EventSink;
pub use web::{create_router, AppState};
