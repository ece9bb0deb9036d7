//! Console sink: writes serialized records to stdout.

use super::Sink;

/// Writes each record as a line to stdout.
pub struct ConsolePublisher;

impl Default for ConsolePublisher {
    fn default() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Sink for ConsolePublisher {
    async fn write_line(&self, message: &str) -> Result<(), String> {
        println!("{message}");
        Ok(())
    }
}
