//! Hub Receiver - authenticated webhook receiver.
//!
//! This binary:
//! - Answers the platform's subscription handshake
//! - Verifies and stores signed event deliveries
//! - Serves the most recent events as JSON
//!
//! Configuration comes from the environment and an optional `.env` file and
//! is validated before the listener is bound; missing values stop the
//! process immediately.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hub_receiver::{router, AppState, Config};

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

    // Load configuration (.env first, process environment wins)
    let config = Config::load().context("Invalid configuration")?;
    info!(
        host = %config.host,
        port = config.port,
        webhook_path = %config.webhook_path,
        event_log_capacity = config.event_log_capacity,
        "config_loaded"
    );

    let addr = SocketAddr::new(config.host, config.port);

    // Create application state and router
    let app = router(AppState::new(config));

    // Bind to address
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

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
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
