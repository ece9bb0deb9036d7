//! Bulkhead: caps concurrent in-flight requests and queued waiters,
//! rejecting with a synthetic 503 rather than blocking indefinitely
//! (spec.md §4.6).
//!
//! No directly analogous policy exists elsewhere in this codebase's
//! outbound call path; built on the standard `tokio::sync::Semaphore`
//! bounded-concurrency idiom and on resilience-policy naming conventions
//! used by comparable AI-provider client code.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Raised when the bulkhead's concurrent and queued capacity are both
/// exhausted. Synthetic — distinct from a transport-level 503.
#[derive(Debug, Error)]
#[error("503 Service Unavailable: bulkhead capacity exceeded")]
pub struct BulkheadError;

/// Holds a permit for the lifetime of a single in-flight call; dropping it
/// releases the slot.
pub struct BulkheadGuard(#[allow(dead_code)] Option<OwnedSemaphorePermit>);

pub struct Bulkhead {
    enabled: bool,
    semaphore: Arc<Semaphore>,
    max_queued: usize,
    waiting: AtomicUsize,
}

impl Bulkhead {
    pub fn new(enabled: bool, max_concurrent: usize, max_queued: usize) -> Self {
        Self {
            enabled,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            max_queued,
            waiting: AtomicUsize::new(0),
        }
    }

    /// Acquire a slot. If the bulkhead is at capacity and the queued-waiter
    /// count would exceed `max_queued`, rejects immediately rather than
    /// waiting.
    pub async fn acquire(&self) -> Result<BulkheadGuard, BulkheadError> {
        if !self.enabled {
            return Ok(BulkheadGuard(None));
        }

        if self.semaphore.available_permits() == 0 {
            let waiting_now = self.waiting.fetch_add(1, Ordering::AcqRel) + 1;
            if waiting_now > self.max_queued {
                self.waiting.fetch_sub(1, Ordering::AcqRel);
                return Err(BulkheadError);
            }
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            self.waiting.fetch_sub(1, Ordering::AcqRel);
            return Ok(BulkheadGuard(Some(permit)));
        }

        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore is never closed");
        Ok(BulkheadGuard(Some(permit)))
    }
}
