//! Outbound alert forwarding.
//!
//! Serializes an [`Event`] to its canonical JSON form and POSTs it to a
//! customer endpoint. A forward is a single attempt: no retries, and no
//! timeout unless the caller imposes one.

use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use url::Url;

use crate::event::Event;

/// Failure of a forward attempt.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Target URL does not parse.
    #[error("invalid target url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Target URL is not http or https.
    #[error("unsupported target url scheme {scheme:?}")]
    UnsupportedScheme { scheme: String },

    /// Event could not be encoded.
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Connection, TLS, or body read failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Target answered with a non-2xx status.
    #[error("target responded with HTTP {status}")]
    Rejected { status: u16, body: String },
}

/// Raw response from the forward target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardResponse {
    pub status: u16,
    pub body: String,
}

impl ForwardResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Turn a non-2xx response into [`ForwardError::Rejected`].
    pub fn error_for_status(self) -> Result<Self, ForwardError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ForwardError::Rejected {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Issues outbound alert POSTs.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: Client,
}

impl Forwarder {
    /// Create a forwarder with its own connection pool.
    pub fn new() -> Result<Self, ForwardError> {
        let client = Client::builder().build().map_err(ForwardError::Client)?;
        Ok(Self { client })
    }

    /// POST the event to `url` and return the target's response as-is.
    ///
    /// Any HTTP status is returned as `Ok`; only failures to complete the
    /// exchange are errors.
    pub async fn forward(&self, event: &Event, url: &str) -> Result<ForwardResponse, ForwardError> {
        let target = Url::parse(url).map_err(|source| ForwardError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        if !matches!(target.scheme(), "http" | "https") {
            return Err(ForwardError::UnsupportedScheme {
                scheme: target.scheme().to_string(),
            });
        }

        let body = serde_json::to_vec(event)?;

        info!(
            event_id = event.event_id(),
            url = %target,
            body_length = body.len(),
            "forward_starting"
        );

        let response = self
            .client
            .post(target)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| transport_error(url, e))?;

        info!(
            event_id = event.event_id(),
            status_code = status,
            response_length = body.len(),
            "forward_complete"
        );

        Ok(ForwardResponse { status, body })
    }

    /// Forward in a detached task, bounded by `timeout`.
    ///
    /// The outcome is logged only.
    pub fn spawn_alert(&self, event: Event, url: String, timeout: Duration) -> JoinHandle<()> {
        let forwarder = self.clone();

        tokio::spawn(async move {
            let event_id = event.event_id();

            match tokio::time::timeout(timeout, forwarder.forward(&event, &url)).await {
                Ok(Ok(response)) if response.is_success() => {
                    info!(
                        event_id = event_id,
                        status_code = response.status,
                        "alert_forward_delivered"
                    );
                }
                Ok(Ok(response)) => {
                    warn!(
                        event_id = event_id,
                        status_code = response.status,
                        "alert_forward_rejected"
                    );
                }
                Ok(Err(e)) => {
                    error!(event_id = event_id, error = %e, "alert_forward_failed");
                }
                Err(_) => {
                    warn!(
                        event_id = event_id,
                        timeout_ms = timeout.as_millis() as u64,
                        "alert_forward_timeout"
                    );
                }
            }
        })
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> ForwardError {
    if e.is_connect() {
        error!(url = url, error = %e, "forward_connect_error");
    } else if e.is_request() {
        error!(url = url, error = %e, "forward_request_error");
    } else {
        error!(url = url, error = %e, "forward_error");
    }

    ForwardError::Transport {
        url: url.to_string(),
        source: e,
    }
}
