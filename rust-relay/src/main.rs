//! Relay Consumer - RabbitMQ subscriber that logs each message.
//!
//! Consumes from the shared queue with auto-acknowledgment and logs each
//! payload, exiting cleanly on SIGINT or SIGTERM.

mod consumer;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    tracing::info!("consumer_starting");

    // Load configuration from environment
    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;
    tracing::info!(queue = %config.queue_name, "config_loaded");

    // Start the consumer
    consumer::run(config).await?;

    Ok(())
}
