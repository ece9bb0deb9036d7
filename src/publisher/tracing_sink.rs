//! EventSource/tracing diagnostic sink: re-emits each record as a `tracing`
//! event, so records flow into whatever subscriber the host process has
//! configured (console, JSON, OTLP, …) alongside the shared serializer's
//! output, matching the `observability::tracing_init` approach to
//! self-observability used elsewhere in this codebase.

use super::Sink;

/// Writes each record as a `tracing::info!` event with the serialized
/// record attached as a field.
pub struct TracingPublisher;

impl Default for TracingPublisher {
    fn default() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Sink for TracingPublisher {
    async fn write_line(&self, message: &str) -> Result<(), String> {
        tracing::info!(record = message, "log event");
        Ok(())
    }
}
