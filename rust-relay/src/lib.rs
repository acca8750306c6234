//! Relay - minimal queue-backed message pipeline.
//!
//! This library provides shared modules for the two relay binaries:
//! - `relay-producer`: HTTP endpoint that publishes messages to the queue
//! - `relay-consumer`: Subscriber that logs each message from the queue
//!
//! ## Architecture
//!
//! ```text
//! HTTP client → Producer → Server1Queue → Consumer → log output
//! ```
//!
//! The two binaries run as independent processes and share only the broker
//! and the queue name.

pub mod config;
pub mod queue;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use queue::Publisher;
pub use web::AppState;
