use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use prometheus::Gauge;

use crate::clock::{Clock, TokioClock};
use crate::models::{Key, RateCheck};

// Rate state - last admitted event per key, plus the longest interval the key
// has been checked against since then (the sweep must not cut that window)
pub struct RateState {
    pub last_event: Instant,
    pub interval: Duration,
}

/// Minimum-interval limiter keyed by user (or user+room).
///
/// One instance per logical scope; the per-key map is never shared.
pub struct KeyedRateLimiter<K = Key> {
    entries: DashMap<K, RateState>,
    clock: Arc<dyn Clock>,
    tracked: Option<Gauge>,
}

impl<K: Eq + Hash + Clone> KeyedRateLimiter<K> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(TokioClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            tracked: None,
        }
    }

    // Keep `gauge` in step with the number of tracked keys
    pub fn with_gauge(mut self, gauge: Gauge) -> Self {
        gauge.add(self.entries.len() as f64);
        self.tracked = Some(gauge);
        self
    }

    /// Admits the event when at least `min_interval_secs` have passed since the
    /// last admitted one for `key`. A zero or negative interval disables the
    /// check without touching stored state. Denials leave state untouched and
    /// report the remaining wait rounded up to whole seconds.
    pub fn check_rate_limit(&self, key: &K, min_interval_secs: i64) -> RateCheck {
        if min_interval_secs <= 0 {
            return RateCheck::admit();
        }
        let interval = Duration::from_secs(min_interval_secs as u64);
        let now = self.clock.now();

        let mut entry = match self.entries.entry(key.clone()) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(slot) => {
                // first event for this key always passes
                slot.insert(RateState { last_event: now, interval });
                if let Some(gauge) = &self.tracked {
                    gauge.inc();
                }
                return RateCheck::admit();
            }
        };

        let state = entry.get_mut();
        let elapsed = now.saturating_duration_since(state.last_event);
        if elapsed >= interval {
            state.last_event = now;
            state.interval = interval;
            return RateCheck::admit();
        }
        state.interval = state.interval.max(interval);

        let remaining = interval - elapsed;
        let secs = remaining.as_nanos().div_ceil(1_000_000_000) as u64;
        RateCheck::deny(secs)
    }

    // Drop keys idle for longer than max_idle whose rate window has also
    // run out; a key still inside its window is kept whatever its age
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, state| {
            now.saturating_duration_since(state.last_event) < max_idle.max(state.interval)
        });
        let swept = before.saturating_sub(self.entries.len());
        if let Some(gauge) = &self.tracked {
            gauge.sub(swept as f64);
        }
        swept
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedRateLimiter<K> {
    fn default() -> Self {
        Self::new()
    }
}
