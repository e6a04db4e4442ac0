//! Per-key inactivity timers
//!
//! `signal_active` arms (or re-arms) a timer for a key; if nothing else
//! happens for that key before it expires, the callback runs once.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::models::Key;

// Live timer for one key. The generation tells a waking task whether it
// is still the current timer or was superseded while it slept.
struct PendingTimer {
    generation: u64,
    handle: AbortHandle,
}

/// Debounce timers, at most one pending per key.
///
/// Timers are tokio tasks, so `signal_active` must be called from within a
/// tokio runtime.
pub struct DebounceTimeoutManager<K: Eq + Hash = Key> {
    pending: Arc<DashMap<K, PendingTimer>>,
    next_generation: AtomicU64,
}

impl<K> DebounceTimeoutManager<K>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Cancels any pending timer for `key` and schedules `on_timeout` to run
    /// after `timeout` of inactivity.
    ///
    /// Replacement happens under the key's map lock: a superseded timer that
    /// is already waking up finds a newer generation in the slot and exits
    /// without firing.
    pub fn signal_active<F>(&self, key: K, timeout: Duration, on_timeout: F)
    where
        F: FnOnce(K) + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        // anchored to the call, not to when the task first gets polled
        let deadline = Instant::now() + timeout;
        let slot = self.pending.entry(key.clone());

        let pending = Arc::clone(&self.pending);
        let task_key = key;
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let current = pending
                .remove_if(&task_key, |_, timer| timer.generation == generation)
                .is_some();
            if current {
                debug!(key = ?task_key, "inactivity timeout fired");
                on_timeout(task_key);
            }
        });

        let timer = PendingTimer {
            generation,
            handle: task.abort_handle(),
        };
        match slot {
            Entry::Occupied(mut occupied) => {
                let old = occupied.insert(timer);
                old.handle.abort();
            }
            Entry::Vacant(vacant) => {
                vacant.insert(timer);
            }
        }
    }

    // Cancel the pending timer, if any
    pub fn signal_inactive(&self, key: &K) {
        if let Some((_, timer)) = self.pending.remove(key) {
            timer.handle.abort();
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl<K> Default for DebounceTimeoutManager<K>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> Drop for DebounceTimeoutManager<K> {
    fn drop(&mut self) {
        for timer in self.pending.iter() {
            timer.handle.abort();
        }
    }
}
