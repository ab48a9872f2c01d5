//! Webhook Relay - HTTP receiver for JSON event webhooks.
//!
//! This binary:
//! - Accepts event payloads on `POST /webhook`
//! - Validates and records them in memory
//! - Optionally forwards each accepted event to `ALERT_TARGET_URL`

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webhook_relay::{create_router, AppState, Config, EventSink, Forwarder};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        host = %config.host,
        port = config.port,
        alert_forwarding = config.alert_forwarding_enabled(),
        alert_timeout_ms = config.alert_timeout_ms,
        "config_loaded"
    );

    let forwarder = Forwarder::new().context("Failed to create forwarder")?;

    let bind_host = config.host.clone();
    let port = config.port;

    let state = AppState::new(config, EventSink::new(), forwarder);
    let app = create_router(state);

    let listener = TcpListener::bind((bind_host.as_str(), port))
        .await
        .context("Failed to bind to address")?;
    let addr: SocketAddr = listener
        .local_addr()
        .context("Failed to read bound address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
