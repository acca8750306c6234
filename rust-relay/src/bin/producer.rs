//! Relay Producer - HTTP front end that publishes messages to the queue.
//!
//! Accepts `GET /send?msg=...`, wraps the message as a text/plain payload,
//! and publishes it to the shared queue. The queue is declared before the
//! listener starts, so a broker problem fails startup rather than the
//! first request.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay::web::{health, send, AppState};
use relay::{Config, Publisher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("producer_starting");

    // Load configuration
    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;
    info!(
        port = config.port,
        queue = %config.queue_name,
        "config_loaded"
    );

    // Connect and declare the queue before accepting any requests
    let publisher = Publisher::new(config.amqp_url.clone(), config.queue_name.clone());
    publisher
        .connect()
        .await
        .context("Failed to set up RabbitMQ")?;

    // Create application state
    let state = AppState::new(config.clone(), publisher.clone());

    // Build the router
    let app = Router::new()
        .route("/health", get(health))
        .route("/send", get(send))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "producer_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Close publisher connection
    publisher.close().await;

    info!("producer_shutdown_complete");

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

    info!("producer_shutting_down");
}
