//! Composes the four policies in fixed order: bulkhead → circuit-breaker →
//! retry → timeout → transport (spec.md §4.6). Each policy is independently
//! disableable; with all disabled the transport is called directly.

use std::{future::Future, time::Duration};

use crate::error::Error;

use super::{Bulkhead, CircuitBreaker, RetryPolicy, TimeoutPolicy};

/// Settings needed to build a [`ResilientHttp`] pipeline.
pub struct ResilientHttpConfig {
    pub timeout: TimeoutPolicy,
    pub retry: RetryPolicy,
    pub circuit_breaker_enabled: bool,
    pub circuit_breaker_failure_threshold: u32,
    pub circuit_breaker_cooling_period: Duration,
    pub bulkhead_enabled: bool,
    pub bulkhead_max_concurrent: usize,
    pub bulkhead_max_queued: usize,
}

impl Default for ResilientHttpConfig {
    fn default() -> Self {
        Self {
            timeout: TimeoutPolicy::default(),
            retry: RetryPolicy::default(),
            circuit_breaker_enabled: true,
            circuit_breaker_failure_threshold: 5,
            circuit_breaker_cooling_period: Duration::from_secs(30),
            bulkhead_enabled: true,
            bulkhead_max_concurrent: 10,
            bulkhead_max_queued: 20,
        }
    }
}

/// The composed resilience pipeline around an HTTP transport.
pub struct ResilientHttp {
    timeout: TimeoutPolicy,
    retry: RetryPolicy,
    circuit_breaker: CircuitBreaker,
    bulkhead: Bulkhead,
}

impl ResilientHttp {
    pub fn new(config: ResilientHttpConfig) -> Self {
        Self {
            timeout: config.timeout,
            retry: config.retry,
            circuit_breaker: CircuitBreaker::new(
                config.circuit_breaker_enabled,
                config.circuit_breaker_failure_threshold,
                config.circuit_breaker_cooling_period,
            ),
            bulkhead: Bulkhead::new(
                config.bulkhead_enabled,
                config.bulkhead_max_concurrent,
                config.bulkhead_max_queued,
            ),
        }
    }

    pub fn circuit_state(&self) -> super::CircuitState {
        self.circuit_breaker.state()
    }

    /// Execute `make_request` through bulkhead → circuit-breaker → retry →
    /// timeout → transport. `make_request` is called once per attempt.
    pub async fn execute<F, Fut>(&self, make_request: F) -> Result<reqwest::Response, Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        // Bulkhead: caps in-flight + queued concurrency, outermost so a
        // rejection never consumes a circuit-breaker or retry attempt.
        let _permit = self.bulkhead.acquire().await?;

        // Circuit breaker: fail fast without attempting the call at all.
        self.circuit_breaker.check()?;

        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_err: Option<Error> = None;

        for attempt in 0..max_attempts {
            let outcome = self
                .timeout
                .run(make_request())
                .await
                .map_err(Error::from)
                .and_then(|r| r.map_err(Error::from));

            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if self.retry.should_retry_status(status.as_u16()) && attempt + 1 < max_attempts
                    {
                        self.circuit_breaker.record_failure();
                        tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
                        last_err = Some(Error::Upstream(format!(
                            "retryable status {status} on attempt {}",
                            attempt + 1
                        )));
                        continue;
                    }
                    if status.is_server_error() {
                        self.circuit_breaker.record_failure();
                    } else {
                        self.circuit_breaker.record_success();
                    }
                    return Ok(response);
                }
                Err(Error::Transport(transport_err)) => {
                    let retryable = self.retry.is_retryable_transport_error(&transport_err);
                    self.circuit_breaker.record_failure();
                    if retryable && attempt + 1 < max_attempts {
                        tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
                        last_err = Some(Error::Transport(transport_err));
                        continue;
                    }
                    return Err(Error::Transport(transport_err));
                }
                Err(Error::Timeout(timeout_err)) => {
                    self.circuit_breaker.record_failure();
                    if attempt + 1 < max_attempts {
                        tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
                        last_err = Some(Error::Timeout(timeout_err));
                        continue;
                    }
                    return Err(Error::Timeout(timeout_err));
                }
                Err(other) => return Err(other),
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Upstream("retries exhausted".to_string())))
    }
}
