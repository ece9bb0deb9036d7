//! Retry with exponential backoff and jitter (spec.md §4.6).
//!
//! Shaped closely on `providers::retry::with_retry` and
//! `config::providers::RetryConfig::delay_for_attempt`: the same
//! attempt-count loop and backoff formula, generalized from a
//! provider-specific retry helper into a reusable policy struct used by
//! [`super::ResilientHttp`].

use std::time::Duration;

use rand::Rng;

/// Exponential-backoff retry policy (spec.md §4.6): base delay, max delay
/// cap, jitter percentage, max attempt count.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub enabled: bool,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: f64,
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            jitter: 0.2,
            retryable_status_codes: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying the given zero-indexed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay = self.base_delay.as_millis() as f64 * 2f64.powi(attempt as i32);
        let capped = base_delay.min(self.max_delay.as_millis() as f64);
        let jitter_range = capped * self.jitter;
        let jitter = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..jitter_range)
        } else {
            0.0
        };
        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }

    pub fn should_retry_status(&self, status: u16) -> bool {
        self.enabled && self.retryable_status_codes.contains(&status)
    }

    pub fn is_retryable_transport_error(&self, error: &reqwest::Error) -> bool {
        self.enabled && (error.is_connect() || error.is_timeout() || error.is_request())
    }
}
