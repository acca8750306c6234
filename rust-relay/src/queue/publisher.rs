//! Async RabbitMQ publisher for the producer's HTTP handlers.
//!
//! The publisher owns one connection and one channel, shared by every
//! request handler. Access goes through async locks, so concurrent
//! handlers never race on the channel, and a channel lost after startup is
//! re-established on the next publish.

use std::sync::Arc;

use anyhow::{Context, Result};
use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Async RabbitMQ publisher with connection management.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    url: String,
    queue: String,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
}

impl Publisher {
    /// Create a new publisher for the given broker URL and queue.
    ///
    /// Does not connect; call [`Publisher::connect`] before serving
    /// traffic.
    pub fn new(url: String, queue: String) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                url,
                queue,
                connection: RwLock::new(None),
                channel: RwLock::new(None),
            }),
        }
    }

    /// Connect to the broker and declare the queue up front.
    ///
    /// The producer calls this before binding its HTTP listener, so an
    /// unreachable broker or undeclarable queue fails startup instead of
    /// failing the first request.
    pub async fn connect(&self) -> Result<()> {
        self.ensure_connected().await.map(|_| ())
    }

    /// Ensure we have a valid connection and channel.
    async fn ensure_connected(&self) -> Result<Channel> {
        // Check if we have a valid channel
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        // Need to reconnect
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Double-check after acquiring write lock
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!("rabbitmq_publisher_connecting");

        // Create new connection
        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        info!("rabbitmq_publisher_connected");

        // Create new channel
        let ch = conn
            .create_channel()
            .await
            .context("Failed to create channel")?;

        // Declare the queue (idempotent operation)
        ch.queue_declare(
            &self.inner.queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare queue")?;

        info!(queue = %self.inner.queue, "rabbitmq_queue_declared");

        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    /// Publish a text message to the queue via the default exchange.
    ///
    /// One publish attempt per call; errors surface to the caller.
    pub async fn publish(&self, body: &[u8]) -> Result<()> {
        let channel = self.ensure_connected().await?;

        channel
            .basic_publish(
                "",
                &self.inner.queue,
                BasicPublishOptions::default(),
                body,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("text/plain".into()),
            )
            .await
            .context("Failed to publish message")?
            .await
            .context("Failed to confirm publish")?;

        info!(
            queue = %self.inner.queue,
            body_length = body.len(),
            "rabbitmq_message_published"
        );

        Ok(())
    }

    /// Close the channel and then the connection gracefully.
    pub async fn close(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_connection_close_error");
            }
        }

        info!("rabbitmq_publisher_closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_creation_does_not_connect() {
        let publisher = Publisher::new(
            "amqp://localhost:5672".to_string(),
            "Server1Queue".to_string(),
        );
        // Construction is cheap; no connection is opened until connect()
        assert!(Arc::strong_count(&publisher.inner) == 1);
    }

    #[test]
    fn test_publisher_clone_shares_state() {
        let publisher = Publisher::new(
            "amqp://localhost:5672".to_string(),
            "Server1Queue".to_string(),
        );
        let cloned = publisher.clone();
        assert!(Arc::ptr_eq(&publisher.inner, &cloned.inner));
    }
}
