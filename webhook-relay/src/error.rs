//! Error types for inbound webhook handling.

use thiserror::Error;

use crate::event::ValidationErrors;

/// Why an inbound webhook was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Body absent, empty, or not parseable as JSON.
    #[error("malformed request body: {0}")]
    Malformed(String),

    /// Body is JSON but does not match the event schema.
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

impl WebhookError {
    /// Short label used in log events.
    pub fn reason(&self) -> &'static str {
        match self {
            WebhookError::Malformed(_) => "malformed",
            WebhookError::Invalid(_) => "schema",
        }
    }
}
