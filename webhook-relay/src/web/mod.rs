//! Web server module for handling inbound webhooks.
//!
//! This module provides a small HTTP surface that:
//! - Accepts JSON event payloads on `POST /webhook`
//! - Validates them against the event schema
//! - Records accepted events in the in-memory sink
//! - Exposes the sink read-only on `GET /events`

pub mod handlers;
pub mod response;
pub mod router;

pub use handlers::{health, list_events, receive_webhook, AppState, EventsResponse, HealthResponse};
pub use response::{handle_panic, WebhookResponse, INTERNAL_ERROR_MESSAGE};
pub use router::create_router;
