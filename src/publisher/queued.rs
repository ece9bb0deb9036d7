//! Bounded-backpressure queued publisher: a single background worker drains
//! a FIFO queue into an underlying [`Sink`] (spec.md §4.4, §5).

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::{Mutex, Notify},
    task::JoinHandle,
};

use super::{Publisher, Sink};

/// Default high-water mark: once the queue holds this many messages, the
/// oldest is dropped to make room for the newest (spec.md §4.4).
const DEFAULT_HIGH_WATER_MARK: usize = 10_000;

/// Default dispose deadline (spec.md §4.4).
const DEFAULT_DISPOSE_DEADLINE: Duration = Duration::from_secs(2);

/// Observable counters, testable per spec.md §8 property 6.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublisherStats {
    pub total_events: u64,
    pub dropped: u64,
    pub write_errors: u64,
}

struct Counters {
    total_events: AtomicU64,
    dropped: AtomicU64,
    write_errors: AtomicU64,
}

impl Counters {
    fn new() -> Self {
        Self {
            total_events: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> PublisherStats {
        PublisherStats {
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// A queued publisher wrapping any [`Sink`] with the bounded-backpressure,
/// single-drain-worker contract spec.md §4.4 describes.
pub struct QueuedPublisher {
    queue: Arc<Mutex<VecDeque<String>>>,
    notify: Arc<Notify>,
    high_water_mark: usize,
    counters: Arc<Counters>,
    stop: Arc<AtomicBool>,
    disposed: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
    dispose_deadline: Duration,
}

impl QueuedPublisher {
    /// Spawn a queued publisher draining into `sink`. Must be called from
    /// within a Tokio runtime.
    pub fn new<S: Sink + 'static>(sink: Arc<S>, polling_delay: Duration) -> Arc<Self> {
        Self::with_high_water_mark(sink, polling_delay, DEFAULT_HIGH_WATER_MARK)
    }

    pub fn with_high_water_mark<S: Sink + 'static>(
        sink: Arc<S>,
        polling_delay: Duration,
        high_water_mark: usize,
    ) -> Arc<Self> {
        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let notify = Arc::new(Notify::new());
        let counters = Arc::new(Counters::new());
        let stop = Arc::new(AtomicBool::new(false));

        let worker_queue = queue.clone();
        let worker_notify = notify.clone();
        let worker_counters = counters.clone();
        let worker_stop = stop.clone();
        let handle = tokio::spawn(drain_loop(
            sink,
            worker_queue,
            worker_notify,
            worker_counters,
            worker_stop,
            polling_delay,
        ));

        Arc::new(Self {
            queue,
            notify,
            high_water_mark,
            counters,
            stop,
            disposed: AtomicBool::new(false),
            worker: Mutex::new(Some(handle)),
            dispose_deadline: DEFAULT_DISPOSE_DEADLINE,
        })
    }

    pub fn stats(&self) -> PublisherStats {
        self.counters.snapshot()
    }

    async fn enqueue(&self, message: &str) {
        if message.trim().is_empty() {
            return;
        }
        let mut queue = self.queue.lock().await;
        if queue.len() >= self.high_water_mark {
            queue.pop_front();
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(message.to_string());
        drop(queue);
        self.notify.notify_one();
    }

    /// Signal the worker, wait up to the dispose deadline for it to drain,
    /// then abandon any remainder. Idempotent.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop.store(true, Ordering::SeqCst);
        self.notify.notify_one();

        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            let _ = tokio::time::timeout(self.dispose_deadline, handle).await;
        }
    }
}

#[async_trait::async_trait]
impl Publisher for QueuedPublisher {
    async fn write(&self, message: &str) {
        self.enqueue(message).await;
    }

    async fn write_line(&self, message: &str) {
        self.enqueue(message).await;
    }
}

async fn drain_loop<S: Sink + 'static>(
    sink: Arc<S>,
    queue: Arc<Mutex<VecDeque<String>>>,
    notify: Arc<Notify>,
    counters: Arc<Counters>,
    stop: Arc<AtomicBool>,
    polling_delay: Duration,
) {
    loop {
        let next = queue.lock().await.pop_front();
        match next {
            Some(message) => match sink.write_line(&message).await {
                Ok(()) => {
                    counters.total_events.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    counters.write_errors.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(error = %err, "queued publisher: sink write failed, dropping message");
                }
            },
            None => {
                if stop.load(Ordering::SeqCst) {
                    return;
                }
                tokio::select! {
                    _ = notify.notified() => {}
                    _ = tokio::time::sleep(polling_delay) => {}
                }
            }
        }
    }
}
