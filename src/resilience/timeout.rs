//! Per-request deadline enforced by cancellation (spec.md §4.6).

use std::time::Duration;

use thiserror::Error;

/// Raised when a call exceeds its deadline.
#[derive(Debug, Error)]
#[error("request exceeded its {0:?} deadline")]
pub struct TimeoutError(pub Duration);

/// Timeout policy: default 60s (spec.md §4.6), independently disableable.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutPolicy {
    pub enabled: bool,
    pub duration: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: Duration::from_secs(60),
        }
    }
}

impl TimeoutPolicy {
    pub fn new(enabled: bool, duration: Duration) -> Self {
        Self { enabled, duration }
    }

    /// Run `fut`, failing with [`TimeoutError`] if it exceeds the
    /// configured deadline. When disabled, runs `fut` with no deadline.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, TimeoutError>
    where
        F: std::future::Future<Output = T>,
    {
        if !self.enabled {
            return Ok(fut.await);
        }
        tokio::time::timeout(self.duration, fut)
            .await
            .map_err(|_| TimeoutError(self.duration))
    }
}
