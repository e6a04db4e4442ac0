//! Keyed rate limiting with debounce timeouts for chat front-ends.
//!
//! - [`rate_limit::KeyedRateLimiter`]: per-key minimum-interval admit/deny
//! - [`debounce::DebounceTimeoutManager`]: per-key cancellable inactivity timers
//! - [`gate::TypingGate`] / [`gate::SlowmodeGate`]: the two configurations
//!   used for typing indicators and slowmode

pub mod clock;
pub mod config;
pub mod debounce;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod sweeper;
pub mod worker;

pub use error::GateError;
pub use gate::{SlowmodeGate, TypingConfig, TypingGate, TypingSink};
pub use models::{Key, RateCheck};
