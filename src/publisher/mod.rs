//! Asynchronous queued publishers (spec.md §4.4).

mod console;
mod queued;
mod tracing_sink;

pub use console::ConsolePublisher;
pub use queued::{PublisherStats, QueuedPublisher};
pub use tracing_sink::TracingPublisher;

/// Build a queued console publisher: the default sink a [`crate::logger::Logger`]
/// writes to when no publisher is configured explicitly.
pub fn console(polling_delay: std::time::Duration) -> std::sync::Arc<QueuedPublisher> {
    QueuedPublisher::new(std::sync::Arc::new(ConsolePublisher), polling_delay)
}

use async_trait::async_trait;

/// A sink that accepts serialized log records.
///
/// Implementations must never let a write failure propagate to the caller
/// (spec.md §4.4, §7): errors are swallowed and counted internally.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn write(&self, message: &str);
    async fn write_line(&self, message: &str);
}

/// The underlying medium a [`QueuedPublisher`] drains into. Kept separate
/// from [`Publisher`] so the queueing/backpressure policy is implemented
/// once and reused across sinks, the way the `dlq` worker module separates
/// the drain loop from the concrete backend.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn write_line(&self, message: &str) -> Result<(), String>;
}
