//! Namespace work queue.
//!
//! Delivers namespace keys to reconcile workers with the standard workqueue
//! discipline: a key is queued at most once, and is never handed to two
//! workers at the same time. A key added while an attempt for it is in
//! flight is parked and re-queued when that attempt finishes, so workers
//! always see the latest state exactly once. Failed keys are re-added after
//! a per-key Fibonacci backoff; success resets the key's backoff.

use crate::backoff::FibonacciBackoff;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tracing::debug;

#[derive(Default)]
struct State {
    queue: VecDeque<String>,
    /// Keys currently sitting in `queue`
    queued: HashSet<String>,
    /// Keys handed to a worker and not yet marked done
    processing: HashSet<String>,
    /// Keys re-added while in flight
    parked: HashSet<String>,
    /// Per-key retry backoff, dropped on success
    backoffs: HashMap<String, FibonacciBackoff>,
    shutdown: bool,
}

struct Inner {
    state: Mutex<State>,
    notify: Notify,
    min_backoff_secs: u64,
    max_backoff_secs: u64,
}

/// Deduplicating, per-key-serializing work queue.
#[derive(Clone)]
pub struct WorkQueue {
    inner: Arc<Inner>,
}

impl WorkQueue {
    /// Create a queue whose retry backoff is bounded by the given seconds.
    pub fn new(min_backoff_secs: u64, max_backoff_secs: u64) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                notify: Notify::new(),
                min_backoff_secs,
                max_backoff_secs,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        // The state is plain collections, coherent even after a panic
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a key. Duplicate adds collapse; adds for an in-flight key are
    /// parked until that attempt completes.
    pub fn add(&self, key: &str) {
        let mut state = self.lock_state();
        if state.shutdown || state.queued.contains(key) {
            return;
        }
        if state.processing.contains(key) {
            state.parked.insert(key.to_string());
            return;
        }
        state.queued.insert(key.to_string());
        state.queue.push_back(key.to_string());
        drop(state);
        self.inner.notify.notify_one();
    }

    /// Wait for the next key. Returns `None` once the queue is shut down and
    /// drained. The returned key is marked in-flight until [`Self::done`].
    pub async fn next(&self) -> Option<String> {
        loop {
            let notified = self.inner.notify.notified();
            {
                let mut state = self.lock_state();
                if let Some(key) = state.queue.pop_front() {
                    state.queued.remove(&key);
                    state.processing.insert(key.clone());
                    if !state.queue.is_empty() {
                        // Pass the wakeup along to the next idle worker
                        self.inner.notify.notify_one();
                    }
                    return Some(key);
                }
                if state.shutdown {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Mark an in-flight key as finished.
    ///
    /// With `requeue_with_backoff` the key is re-added after its next
    /// Fibonacci delay; otherwise its backoff state is reset. Either way a
    /// key that was parked during the attempt is re-queued immediately,
    /// since fresh state is already waiting.
    pub fn done(&self, key: &str, requeue_with_backoff: bool) {
        let delay = {
            let mut state = self.lock_state();
            state.processing.remove(key);
            let parked = state.parked.remove(key);
            if !requeue_with_backoff {
                state.backoffs.remove(key);
            }

            if parked && !state.shutdown {
                state.queued.insert(key.to_string());
                state.queue.push_back(key.to_string());
                self.inner.notify.notify_one();
                None
            } else if requeue_with_backoff && !state.shutdown {
                let (min, max) = (self.inner.min_backoff_secs, self.inner.max_backoff_secs);
                let backoff = state
                    .backoffs
                    .entry(key.to_string())
                    .or_insert_with(|| FibonacciBackoff::new(min, max));
                Some(backoff.next_backoff())
            } else {
                None
            }
        };

        if let Some(delay) = delay {
            debug!("Requeueing {} after {:?}", key, delay);
            let queue = self.clone();
            let key = key.to_string();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                queue.add(&key);
            });
        }
    }

    /// Number of keys waiting in the queue (in-flight keys excluded).
    pub fn len(&self) -> usize {
        self.lock_state().queue.len()
    }

    /// True when no keys are waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop accepting keys and wake all workers so they can drain and exit.
    pub fn shutdown(&self) {
        self.lock_state().shutdown = true;
        self.inner.notify.notify_waiters();
    }
}
