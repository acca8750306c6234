//! Web server module for the producer's HTTP endpoint.
//!
//! A thin server: validate the query string, publish the message to
//! RabbitMQ, respond. Delivery to the consumer happens asynchronously
//! through the broker.

pub mod handlers;

pub use handlers::{health, send, AppState, ErrorResponse, HealthResponse, SendParams, SendResponse};
