use std::sync::Arc;

use crate::gate::{SlowmodeGate, TypingConfig, TypingGate, TypingSink};
use crate::metrics::TRACKED_KEYS;
use crate::rate_limit::KeyedRateLimiter;

// app's shared state - one gate per concern, each owning its own key map
pub struct AppState {
    pub typing: TypingGate,
    pub slowmode: SlowmodeGate,
}

impl AppState {
    pub fn new(typing: TypingConfig, sink: Arc<dyn TypingSink>) -> Self {
        Self {
            typing: TypingGate::with_limiter(
                typing,
                sink,
                KeyedRateLimiter::new().with_gauge(TRACKED_KEYS.clone()),
            ),
            slowmode: SlowmodeGate::with_limiter(
                KeyedRateLimiter::new().with_gauge(TRACKED_KEYS.clone()),
            ),
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.typing.tracked_keys() + self.slowmode.tracked_keys()
    }
}
