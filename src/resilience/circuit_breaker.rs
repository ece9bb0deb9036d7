//! Circuit breaker (spec.md §4.6): closed → open → half-open, with
//! lock-free atomic state so contention never takes a lock across I/O
//! (spec.md §5 locking discipline).
//!
//! Shaped closely on `providers::circuit_breaker`: same packed-atomic
//! state/counter encoding and closed/open/half-open transitions,
//! generalized from per-provider to per-resilience-pipeline instance and
//! simplified to a fixed cooling period (no adaptive backoff, which is out
//! of scope here).

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use thiserror::Error;

const STATE_CLOSED: u32 = 0;
const STATE_OPEN: u32 = 1;
const STATE_HALF_OPEN: u32 = 2;
const STATE_SHIFT: u32 = 30;
const COUNTER_MASK: u32 = (1 << STATE_SHIFT) - 1;

fn pack(state: u32, counter: u32) -> u32 {
    (state << STATE_SHIFT) | (counter & COUNTER_MASK)
}

fn unpack(packed: u32) -> (u32, u32) {
    (packed >> STATE_SHIFT, packed & COUNTER_MASK)
}

/// Raised when the circuit is open and a call is rejected without an
/// outbound attempt (spec.md §4.6, §8 scenario S8).
#[derive(Debug, Error)]
#[error("circuit breaker is open, retry after {retry_after_secs}s")]
pub struct CircuitBreakerError {
    pub retry_after_secs: u64,
}

/// Circuit breaker observable state, useful for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

pub struct CircuitBreaker {
    enabled: bool,
    failure_threshold: u32,
    cooling_period_millis: u64,
    state_and_counter: AtomicU32,
    opened_at_millis: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(enabled: bool, failure_threshold: u32, cooling_period: Duration) -> Self {
        Self {
            enabled,
            failure_threshold,
            cooling_period_millis: cooling_period.as_millis() as u64,
            state_and_counter: AtomicU32::new(pack(STATE_CLOSED, 0)),
            opened_at_millis: AtomicU64::new(0),
        }
    }

    /// Current state, resolving an elapsed open-timeout into half-open as a
    /// side effect (matches `check`'s transition but without consuming a
    /// request slot).
    pub fn state(&self) -> CircuitState {
        let packed = self.state_and_counter.load(Ordering::Acquire);
        match unpack(packed).0 {
            STATE_CLOSED => CircuitState::Closed,
            STATE_OPEN => {
                if self.timeout_elapsed() {
                    CircuitState::HalfOpen
                } else {
                    CircuitState::Open
                }
            }
            _ => CircuitState::HalfOpen,
        }
    }

    fn timeout_elapsed(&self) -> bool {
        let opened_at = self.opened_at_millis.load(Ordering::Acquire);
        now_millis() >= opened_at + self.cooling_period_millis
    }

    /// Check whether a call is allowed through. Transitions open → half-open
    /// when the cooling period has elapsed.
    pub fn check(&self) -> Result<(), CircuitBreakerError> {
        if !self.enabled {
            return Ok(());
        }

        let packed = self.state_and_counter.load(Ordering::Acquire);
        match unpack(packed).0 {
            STATE_CLOSED => Ok(()),
            STATE_OPEN => {
                if self.timeout_elapsed() {
                    self.state_and_counter
                        .store(pack(STATE_HALF_OPEN, 0), Ordering::Release);
                    Ok(())
                } else {
                    let opened_at = self.opened_at_millis.load(Ordering::Acquire);
                    let remaining =
                        (opened_at + self.cooling_period_millis).saturating_sub(now_millis());
                    Err(CircuitBreakerError {
                        retry_after_secs: remaining / 1000,
                    })
                }
            }
            _ => Ok(()), // half-open: allow the probe through
        }
    }

    /// Record a successful call. Closes the circuit from half-open; resets
    /// the failure counter when closed.
    pub fn record_success(&self) {
        if !self.enabled {
            return;
        }
        let packed = self.state_and_counter.load(Ordering::Acquire);
        match unpack(packed).0 {
            STATE_HALF_OPEN => {
                self.state_and_counter
                    .store(pack(STATE_CLOSED, 0), Ordering::Release);
            }
            STATE_CLOSED => {
                self.state_and_counter
                    .store(pack(STATE_CLOSED, 0), Ordering::Release);
            }
            _ => {}
        }
    }

    /// Record a failed call. Any failure while half-open re-opens
    /// immediately; in closed state, opens after `failure_threshold`
    /// consecutive failures.
    pub fn record_failure(&self) {
        if !self.enabled {
            return;
        }
        loop {
            let packed = self.state_and_counter.load(Ordering::Acquire);
            let (state, counter) = unpack(packed);
            match state {
                STATE_HALF_OPEN => {
                    self.open();
                    return;
                }
                STATE_CLOSED => {
                    let next = counter + 1;
                    if next >= self.failure_threshold {
                        self.open();
                        return;
                    }
                    let new_packed = pack(STATE_CLOSED, next);
                    if self
                        .state_and_counter
                        .compare_exchange(
                            packed,
                            new_packed,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        )
                        .is_ok()
                    {
                        return;
                    }
                    // lost the race, retry
                }
                _ => return, // already open
            }
        }
    }

    fn open(&self) {
        self.opened_at_millis.store(now_millis(), Ordering::Release);
        self.state_and_counter
            .store(pack(STATE_OPEN, 0), Ordering::Release);
        tracing::warn!("circuit breaker opened");
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
