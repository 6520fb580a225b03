//! Bounded priority queue with a single rendering worker

use crate::error::AlertError;
use crate::status::StatusBoard;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use vigil_core::config::DispatcherConfig;
use vigil_core::AlertCandidate;
use vigil_spk::{AlertChannel, RenderOutcome};

/// What happened to a submitted candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Queued,
    /// Queue was full, the given older and less urgent item made room
    QueuedWithEviction { evicted: Uuid },
    /// Queue was full of more urgent items, the candidate was discarded
    Dropped,
    /// Dispatcher is shut down
    NotAccepting,
}

impl SubmitOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, SubmitOutcome::Queued | SubmitOutcome::QueuedWithEviction { .. })
    }
}

/// Counters since creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatcherStats {
    pub submitted: u64,
    pub rendered: u64,
    pub failed: u64,
    pub evicted: u64,
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicU64,
    rendered: AtomicU64,
    failed: AtomicU64,
    evicted: AtomicU64,
    dropped: AtomicU64,
}

/// Ordered by (priority, sequence): most urgent first, FIFO within a band
struct PriorityQueue {
    items: BTreeMap<(u8, u64), AlertCandidate>,
    next_seq: u64,
    capacity: usize,
}

impl PriorityQueue {
    fn new(capacity: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            next_seq: 0,
            capacity,
        }
    }

    fn push(&mut self, candidate: AlertCandidate) -> SubmitOutcome {
        let mut outcome = SubmitOutcome::Queued;

        if self.items.len() >= self.capacity {
            // Least urgent band is the last key
            let Some(&(worst_priority, _)) = self.items.keys().next_back() else {
                return SubmitOutcome::Dropped;
            };
            if candidate.priority > worst_priority {
                return SubmitOutcome::Dropped;
            }
            let oldest_of_band = self
                .items
                .range((worst_priority, 0)..=(worst_priority, u64::MAX))
                .next()
                .map(|(key, _)| *key);
            if let Some(key) = oldest_of_band {
                if let Some(evicted) = self.items.remove(&key) {
                    outcome = SubmitOutcome::QueuedWithEviction { evicted: evicted.id };
                }
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.items.insert((candidate.priority, seq), candidate);
        outcome
    }

    fn pop(&mut self) -> Option<AlertCandidate> {
        self.items.pop_first().map(|(_, candidate)| candidate)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        count
    }
}

struct Shared {
    queue: Mutex<PriorityQueue>,
    notify: Notify,
    accepting: AtomicBool,
    counters: Counters,
}

/// Result of [`AlertDispatcher::shutdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Queued candidates that were never rendered
    pub abandoned: usize,
    /// Worker exited within the grace period
    pub clean: bool,
}

/// Alert dispatcher.
///
/// Producers call [`submit`](Self::submit), which never waits. One tokio task
/// renders candidates through the configured [`AlertChannel`], one at a
/// time, so outputs never overlap.
pub struct AlertDispatcher {
    config: DispatcherConfig,
    shared: Arc<Shared>,
    channel: Arc<dyn AlertChannel>,
    status: StatusBoard,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AlertDispatcher {
    pub fn new(
        config: DispatcherConfig,
        channel: Arc<dyn AlertChannel>,
        status: StatusBoard,
    ) -> Result<Self, AlertError> {
        config.validate().map_err(AlertError::Config)?;
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(PriorityQueue::new(config.queue_capacity)),
                notify: Notify::new(),
                accepting: AtomicBool::new(true),
                counters: Counters::default(),
            }),
            config,
            channel,
            status,
            shutdown_tx,
            worker: Mutex::new(None),
        })
    }

    /// Spawn the worker task. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), AlertError> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(AlertError::Dispatcher("Dispatcher already started".to_string()));
        }
        if !self.shared.accepting.load(Ordering::SeqCst) {
            return Err(AlertError::Dispatcher("Dispatcher has been shut down".to_string()));
        }

        let shared = self.shared.clone();
        let channel = self.channel.clone();
        let status = self.status.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();
        let idle_timeout = self.config.idle_timeout();

        *worker = Some(tokio::spawn(run_worker(shared, channel, status, shutdown_rx, idle_timeout)));
        Ok(())
    }

    /// Queue a candidate without blocking.
    ///
    /// On a full queue the oldest item of the least urgent band is evicted,
    /// unless the candidate is less urgent than everything queued, in which
    /// case the candidate itself is dropped.
    pub fn submit(&self, candidate: AlertCandidate) -> SubmitOutcome {
        if !self.shared.accepting.load(Ordering::SeqCst) {
            return SubmitOutcome::NotAccepting;
        }

        let counters = &self.shared.counters;
        counters.submitted.fetch_add(1, Ordering::Relaxed);

        let message = candidate.message.clone();
        let outcome = self.shared.queue.lock().push(candidate);

        match &outcome {
            SubmitOutcome::QueuedWithEviction { evicted } => {
                counters.evicted.fetch_add(1, Ordering::Relaxed);
                warn!("Alert queue full, evicted {} for '{}'", evicted, message);
            }
            SubmitOutcome::Dropped => {
                counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Alert queue full of more urgent alerts, dropped '{}'", message);
            }
            _ => {}
        }

        if outcome.is_queued() {
            self.shared.notify.notify_one();
        }
        outcome
    }

    /// Candidates waiting to be rendered
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().len()
    }

    pub fn is_accepting(&self) -> bool {
        self.shared.accepting.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().as_ref().map(|handle| !handle.is_finished()).unwrap_or(false)
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    pub fn stats(&self) -> DispatcherStats {
        let counters = &self.shared.counters;
        DispatcherStats {
            submitted: counters.submitted.load(Ordering::Relaxed),
            rendered: counters.rendered.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            evicted: counters.evicted.load(Ordering::Relaxed),
            dropped: counters.dropped.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting, abandon queued candidates and wait for the worker.
    ///
    /// A render in progress is allowed to finish; the wait is bounded by the
    /// configured grace period. Calling it twice is harmless.
    pub async fn shutdown(&self) -> ShutdownReport {
        self.shared.accepting.store(false, Ordering::SeqCst);
        self.shutdown_tx.send_replace(true);

        let abandoned = self.shared.queue.lock().clear();
        if abandoned > 0 {
            info!("Abandoned {} queued alerts on shutdown", abandoned);
        }

        let handle = self.worker.lock().take();
        let clean = match handle {
            None => true,
            Some(handle) => match tokio::time::timeout(self.config.shutdown_grace(), handle).await {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    error!("Alert worker panicked: {}", e);
                    false
                }
                Err(_) => {
                    warn!(
                        "Alert worker still rendering after {:?}, leaving it to finish",
                        self.config.shutdown_grace()
                    );
                    false
                }
            },
        };

        ShutdownReport { abandoned, clean }
    }
}

async fn run_worker(
    shared: Arc<Shared>,
    channel: Arc<dyn AlertChannel>,
    status: StatusBoard,
    mut shutdown_rx: watch::Receiver<bool>,
    idle_timeout: Duration,
) {
    info!("Alert worker started (channel: {})", channel.name());

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let next = shared.queue.lock().pop();
        let Some(candidate) = next else {
            tokio::select! {
                _ = shared.notify.notified() => {}
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(idle_timeout) => {}
            }
            continue;
        };

        match channel.render(&candidate).await {
            Ok(RenderOutcome::Played { bytes }) => {
                status.set_last_message(&candidate.message);
                shared.counters.rendered.fetch_add(1, Ordering::Relaxed);
                debug!("Rendered [{}] '{}' ({} bytes)", candidate.level, candidate.message, bytes);
            }
            Ok(RenderOutcome::Skipped(reason)) => {
                status.set_last_message(&candidate.message);
                shared.counters.rendered.fetch_add(1, Ordering::Relaxed);
                debug!("Nothing played for '{}': {}", candidate.message, reason);
            }
            Err(e) => {
                shared.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!("Failed to render '{}': {}", candidate.message, e);
            }
        }
    }

    info!("Alert worker stopped");
}
