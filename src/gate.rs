//! Typing and slowmode gates built from the keyed limiter and debounce timers.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::clock::{Clock, TokioClock};
use crate::debounce::DebounceTimeoutManager;
use crate::error::GateError;
use crate::metrics::{
    SLOWMODE_ADMITTED, SLOWMODE_DENIED, TYPING_DENIED, TYPING_EMITTED, TYPING_TIMEOUTS,
};
use crate::models::{Key, RateCheck, SlowmodeSettings};
use crate::rate_limit::KeyedRateLimiter;

/// Receives typing state changes. Fire-and-forget: the gate never waits on
/// or inspects the outcome of an emission.
pub trait TypingSink: Send + Sync {
    fn emit(&self, key: &Key, typing: bool);
}

#[derive(Debug, Clone, Copy)]
pub struct TypingConfig {
    // Minimum spacing between emitted start/stop signals per key
    pub rate_limit_secs: i64,
    // Inactivity after an admitted start before an implicit stop is sent
    pub timeout: Duration,
    // Implicit stops skip the limiter (for timeouts shorter than the window)
    pub timeout_bypasses_limit: bool,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            rate_limit_secs: 5,
            timeout: Duration::from_millis(5000),
            timeout_bypasses_limit: false,
        }
    }
}

// Rate check shared by start, explicit stop and implicit stop
fn admit(limiter: &KeyedRateLimiter<Key>, key: &Key, secs: i64, what: &str) -> bool {
    let admitted = limiter.check_rate_limit(key, secs).can_send;
    if !admitted {
        TYPING_DENIED.inc();
        debug!(%key, "typing {} suppressed", what);
    }
    admitted
}

/// Typing indicator throttle.
///
/// Start and stop share one limiter: either call arriving within the rate
/// window of the last admitted one is dropped without side effects. An
/// admitted start arms the inactivity timer, which is not extended by
/// further (denied) starts. When the timer runs out it takes the stop path,
/// limiter check included, unless `timeout_bypasses_limit` is set.
pub struct TypingGate {
    limiter: Arc<KeyedRateLimiter<Key>>,
    timers: DebounceTimeoutManager<Key>,
    sink: Arc<dyn TypingSink>,
    config: TypingConfig,
}

impl TypingGate {
    pub fn new(config: TypingConfig, sink: Arc<dyn TypingSink>) -> Self {
        Self::with_clock(config, sink, Arc::new(TokioClock))
    }

    pub fn with_clock(config: TypingConfig, sink: Arc<dyn TypingSink>, clock: Arc<dyn Clock>) -> Self {
        Self::with_limiter(config, sink, KeyedRateLimiter::with_clock(clock))
    }

    pub fn with_limiter(config: TypingConfig, sink: Arc<dyn TypingSink>, limiter: KeyedRateLimiter<Key>) -> Self {
        Self {
            limiter: Arc::new(limiter),
            timers: DebounceTimeoutManager::new(),
            sink,
            config,
        }
    }

    // Returns whether typing=true was emitted
    pub fn start_typing(&self, key: &Key) -> bool {
        if !admit(&self.limiter, key, self.config.rate_limit_secs, "start") {
            return false;
        }

        self.sink.emit(key, true);
        TYPING_EMITTED.inc();

        let limiter = Arc::clone(&self.limiter);
        let sink = Arc::clone(&self.sink);
        let config = self.config;
        self.timers.signal_active(key.clone(), config.timeout, move |key| {
            // the pending slot is already cleared when this runs
            if config.timeout_bypasses_limit
                || admit(&limiter, &key, config.rate_limit_secs, "timeout stop")
            {
                TYPING_TIMEOUTS.inc();
                sink.emit(&key, false);
            }
        });
        true
    }

    // Returns whether typing=false was emitted
    pub fn stop_typing(&self, key: &Key) -> bool {
        if !admit(&self.limiter, key, self.config.rate_limit_secs, "stop") {
            return false;
        }

        self.timers.signal_inactive(key);
        self.sink.emit(key, false);
        TYPING_EMITTED.inc();
        true
    }

    pub fn is_typing(&self, key: &Key) -> bool {
        self.timers.is_pending(key)
    }

    pub fn config(&self) -> TypingConfig {
        self.config
    }

    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        self.limiter.sweep_idle(max_idle)
    }

    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }
}

/// Slowmode: per-user minimum spacing between messages.
pub struct SlowmodeGate {
    limiter: KeyedRateLimiter<Key>,
    rooms: DashMap<String, SlowmodeSettings>,
}

impl SlowmodeGate {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(TokioClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_limiter(KeyedRateLimiter::with_clock(clock))
    }

    pub fn with_limiter(limiter: KeyedRateLimiter<Key>) -> Self {
        Self {
            limiter,
            rooms: DashMap::new(),
        }
    }

    // A duration <= 0 means slowmode is off
    pub fn can_send_message(&self, key: &Key, slowmode_duration_secs: i64) -> RateCheck {
        let check = self.limiter.check_rate_limit(key, slowmode_duration_secs);
        if check.can_send {
            SLOWMODE_ADMITTED.inc();
        } else {
            SLOWMODE_DENIED.inc();
            debug!(%key, remaining = ?check.time_remaining, "slowmode denied");
        }
        check
    }

    // Check against the room's configured slowmode (off when unset)
    pub fn check_room(&self, key: &Key) -> RateCheck {
        let secs = key
            .room()
            .map(|room| self.room_settings(room).effective_secs())
            .unwrap_or(0);
        self.can_send_message(key, secs)
    }

    pub fn set_room(&self, room: &str, settings: SlowmodeSettings) -> Result<SlowmodeSettings, GateError> {
        let settings = settings.validate()?;
        self.rooms.insert(room.to_string(), settings);
        Ok(settings)
    }

    pub fn room_settings(&self, room: &str) -> SlowmodeSettings {
        self.rooms.get(room).map(|s| *s).unwrap_or_default()
    }

    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        self.limiter.sweep_idle(max_idle)
    }

    pub fn tracked_keys(&self) -> usize {
        self.limiter.len()
    }
}

impl Default for SlowmodeGate {
    fn default() -> Self {
        Self::new()
    }
}
