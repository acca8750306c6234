//! Queue module for RabbitMQ operations.
//!
//! This module provides the async publisher that owns the producer's
//! connection and channel.
//!
//! ## Architecture
//!
//! ```text
//! HTTP client → Producer → Server1Queue → Consumer → log output
//! ```

pub mod publisher;

pub use publisher::Publisher;
