//! RabbitMQ consumer module using lapin.
//!
//! This module handles connecting to RabbitMQ, subscribing to the shared
//! queue with auto-acknowledgment, and logging each message until a
//! shutdown signal arrives.

use anyhow::{Context, Result};
use futures::StreamExt;
use lapin::{
    options::{BasicConsumeOptions, QueueDeclareOptions},
    types::FieldTable,
    Connection, ConnectionProperties,
};
use tokio::signal;
use tracing::{error, info, warn};

use relay::Config;

/// Run the RabbitMQ consumer.
///
/// This function:
/// 1. Connects to RabbitMQ using the configured URL
/// 2. Declares the queue (idempotent operation)
/// 3. Consumes messages with auto-acknowledgment, logging each payload
/// 4. Handles graceful shutdown on SIGINT/SIGTERM
pub async fn run(config: Config) -> Result<()> {
    // Connect to RabbitMQ
    info!(url_length = config.amqp_url.len(), "rabbitmq_connecting");

    let conn = Connection::connect(&config.amqp_url, ConnectionProperties::default())
        .await
        .context("Failed to connect to RabbitMQ")?;

    info!("rabbitmq_connected");

    // Create a channel
    let channel = conn
        .create_channel()
        .await
        .context("Failed to create channel")?;

    info!("rabbitmq_channel_created");

    // Declare the queue (durable to match the producer)
    channel
        .queue_declare(
            &config.queue_name,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare queue")?;

    info!(queue = %config.queue_name, "rabbitmq_queue_declared");

    // Consume with auto-ack: the broker considers a message delivered as
    // soon as it reaches this client. Empty consumer tag, so the broker
    // assigns one.
    let mut consumer = channel
        .basic_consume(
            &config.queue_name,
            "",
            BasicConsumeOptions {
                no_ack: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to start consumer")?;

    info!(queue = %config.queue_name, "rabbitmq_consumer_started");
    info!("consumer_ready");

    // Create shutdown signal future
    let shutdown = async {
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
    };

    // Pin the shutdown future
    tokio::pin!(shutdown);

    // Process messages until shutdown
    loop {
        tokio::select! {
            // Check for shutdown signal
            _ = &mut shutdown => {
                info!("consumer_stopping");
                break;
            }
            // Log next message
            delivery = consumer.next() => {
                match delivery {
                    Some(Ok(delivery)) => {
                        info!(
                            queue = %config.queue_name,
                            message = %String::from_utf8_lossy(&delivery.data),
                            "message_received"
                        );
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "rabbitmq_delivery_error");
                    }
                    None => {
                        warn!("rabbitmq_consumer_closed");
                        break;
                    }
                }
            }
        }
    }

    // Release the channel before the connection
    if let Err(e) = channel.close(200, "Normal shutdown").await {
        warn!(error = %e, "rabbitmq_channel_close_error");
    }

    if let Err(e) = conn.close(200, "Normal shutdown").await {
        warn!(error = %e, "rabbitmq_connection_close_error");
    }

    info!("consumer_shutdown_complete");
    Ok(())
}
