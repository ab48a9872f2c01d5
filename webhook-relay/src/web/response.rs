//! Response bodies and error-to-status mapping.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::WebhookError;
use crate::event::FieldError;

/// Message returned for faults that must not leak internals.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Body of every `/webhook` response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl WebhookResponse {
    pub fn success(event_id: i64) -> Self {
        Self {
            status: "success",
            event_id: Some(event_id),
            message: None,
            errors: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            event_id: None,
            message: Some(message.into()),
            errors: None,
        }
    }

    pub fn field_errors(errors: Vec<FieldError>) -> Self {
        Self {
            status: "error",
            event_id: None,
            message: None,
            errors: Some(errors),
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let body = match self {
            WebhookError::Malformed(message) => WebhookResponse::message(message),
            WebhookError::Invalid(errors) => WebhookResponse::field_errors(errors.into_errors()),
        };

        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// Convert a handler panic into a generic 500.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    error!(detail = %detail, "webhook_internal_fault");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(WebhookResponse::message(INTERNAL_ERROR_MESSAGE)),
    )
        .into_response()
}
