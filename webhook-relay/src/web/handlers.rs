//! Webhook endpoint handlers.
//!
//! The inbound handler runs a single linear pass:
//! 1. Parse the body as JSON
//! 2. Validate it against the event schema
//! 3. Record the event in the sink
//! 4. Respond with the event identifier
//!
//! Forwarding only happens when an alert target is configured, and never
//! delays the response.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::WebhookError;
use crate::event::{parse_body, Event};
use crate::forward::Forwarder;
use crate::sink::EventSink;
use crate::web::response::WebhookResponse;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sink: EventSink,
    pub forwarder: Forwarder,
}

impl AppState {
    pub fn new(config: Config, sink: EventSink, forwarder: Forwarder) -> Self {
        Self {
            config: Arc::new(config),
            sink,
            forwarder,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Inbound Webhook
// =============================================================================

/// Webhook endpoint.
///
/// Responds 200 with the event id on success, 400 for a malformed body or
/// schema violations. Rejected payloads never reach the sink.
pub async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    info!(body_length = body.len(), "webhook_received");

    let event = match parse_body(&body) {
        Ok(event) => event,
        Err(e) => {
            log_rejection(&e);
            return e.into_response();
        }
    };

    let event_id = event.event_id();
    let alert = state
        .config
        .alert_target_url
        .as_ref()
        .map(|url| (event.clone(), url.clone()));

    let position = state.sink.record(event).await;

    info!(
        event_id = event_id,
        position = position,
        "webhook_accepted"
    );

    if let Some((event, url)) = alert {
        state
            .forwarder
            .spawn_alert(event, url, state.config.alert_timeout());
    }

    (StatusCode::OK, Json(WebhookResponse::success(event_id))).into_response()
}

fn log_rejection(e: &WebhookError) {
    match e {
        WebhookError::Malformed(message) => {
            warn!(reason = e.reason(), message = %message, "webhook_rejected_malformed");
        }
        WebhookError::Invalid(errors) => {
            warn!(
                reason = e.reason(),
                error_count = errors.len(),
                fields = ?errors.fields(),
                "webhook_rejected_invalid"
            );
        }
    }
}

// =============================================================================
// Event Inspection
// =============================================================================

/// Recorded events, in arrival order.
#[derive(Serialize)]
pub struct EventsResponse {
    pub status: &'static str,
    pub count: usize,
    pub events: Vec<Event>,
}

/// Read-only view of the sink.
pub async fn list_events(State(state): State<AppState>) -> Json<EventsResponse> {
    let events = state.sink.all().await;

    Json(EventsResponse {
        status: "success",
        count: events.len(),
        events,
    })
}
