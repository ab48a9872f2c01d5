//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables, falling back to
//! defaults when a variable is unset or cannot be parsed.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Default interface to bind the web server to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port for the web server.
pub const DEFAULT_PORT: u16 = 5000;

/// Default upper bound on an automatic alert forward, in milliseconds.
pub const DEFAULT_ALERT_TIMEOUT_MS: u64 = 5000;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interface for the web server to bind to
    pub host: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// Customer endpoint that receives an alert for every accepted webhook.
    ///
    /// Unset by default, in which case receipt and forwarding stay decoupled.
    pub alert_target_url: Option<String>,

    /// Timeout imposed on each automatic alert forward
    pub alert_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            alert_target_url: None,
            alert_timeout_ms: DEFAULT_ALERT_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            host: env::var("HOST")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),

            port: parse_number("PORT", DEFAULT_PORT),

            alert_target_url: parse_optional("ALERT_TARGET_URL"),

            alert_timeout_ms: parse_number("ALERT_TIMEOUT_MS", DEFAULT_ALERT_TIMEOUT_MS),
        }
    }

    /// Timeout for automatic alert forwards as a [`Duration`].
    pub fn alert_timeout(&self) -> Duration {
        Duration::from_millis(self.alert_timeout_ms)
    }

    /// Whether accepted webhooks are forwarded automatically.
    pub fn alert_forwarding_enabled(&self) -> bool {
        self.alert_target_url.is_some()
    }
}

/// Parse a numeric variable, warning and using the default on bad input.
fn parse_number<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}

/// Read a variable that is treated as unset when empty.
fn parse_optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|v| !v.is_empty())
}
