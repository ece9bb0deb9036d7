//! Resilient HTTP: timeout + retry + circuit breaker + bulkhead composed
//! around an HTTP transport (spec.md §4.6).

mod bulkhead;
mod circuit_breaker;
mod pipeline;
mod retry;
mod timeout;

pub use bulkhead::{Bulkhead, BulkheadError, BulkheadGuard};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
pub use pipeline::{ResilientHttp, ResilientHttpConfig};
pub use retry::RetryPolicy;
pub use timeout::{TimeoutError, TimeoutPolicy};

impl From<&crate::settings::ResilientHttpSettings> for ResilientHttpConfig {
    fn from(settings: &crate::settings::ResilientHttpSettings) -> Self {
        Self {
            timeout: TimeoutPolicy::new(settings.timeout.enabled, settings.timeout.duration),
            retry: RetryPolicy {
                enabled: settings.retry.enabled,
                max_attempts: settings.retry.max_attempts,
                base_delay: settings.retry.base_delay,
                max_delay: settings.retry.max_delay,
                jitter: settings.retry.jitter,
                retryable_status_codes: settings.retry.retryable_status_codes.clone(),
            },
            circuit_breaker_enabled: settings.circuit_breaker.enabled,
            circuit_breaker_failure_threshold: settings.circuit_breaker.consecutive_failure_threshold,
            circuit_breaker_cooling_period: settings.circuit_breaker.open_cooling_period,
            bulkhead_enabled: settings.bulkhead.enabled,
            bulkhead_max_concurrent: settings.bulkhead.max_concurrent,
            bulkhead_max_queued: settings.bulkhead.max_queued,
        }
    }
}
