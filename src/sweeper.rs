use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::{debug, info};

use crate::state::AppState;

// Evict limiter state for keys idle longer than max_idle; returns how many went
pub fn sweep_once(state: &AppState, max_idle: Duration) -> usize {
    state.typing.sweep_idle(max_idle) + state.slowmode.sweep_idle(max_idle)
}

// Idle sweeper - runs every `every` for the life of the server

pub async fn idle_sweeper(state: Arc<AppState>, every: Duration, max_idle: Duration) {
    let mut interval = interval(every.max(Duration::from_secs(1)));

    info!("Idle sweeper started (interval: {:?}, ttl: {:?})", every, max_idle);

    loop {
        interval.tick().await;

        let swept = sweep_once(&state, max_idle);
        if swept > 0 {
            debug!(swept, remaining = state.tracked_keys(), "evicted idle keys");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{TypingConfig, TypingSink};
    use crate::models::Key;

    struct NullSink;

    impl TypingSink for NullSink {
        fn emit(&self, _key: &Key, _typing: bool) {}
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_evicts_idle_keys_from_both_gates() {
        let state = AppState::new(TypingConfig::default(), Arc::new(NullSink));
        state.typing.start_typing(&Key::in_room("idle", "!r"));
        state.slowmode.can_send_message(&Key::new("idle"), 10);

        tokio::time::advance(Duration::from_secs(30)).await;
        state.slowmode.can_send_message(&Key::new("active"), 10);
        assert_eq!(state.tracked_keys(), 3);

        assert_eq!(sweep_once(&state, Duration::from_secs(20)), 2);
        assert_eq!(state.tracked_keys(), 1);
    }
}
