use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref TYPING_EMITTED: Counter =
        register_counter!("chat_gate_typing_emitted_total", "Typing signals admitted and emitted").unwrap();
    pub static ref TYPING_DENIED: Counter =
        register_counter!("chat_gate_typing_denied_total", "Typing signals suppressed by the rate limit").unwrap();
    pub static ref TYPING_TIMEOUTS: Counter =
        register_counter!("chat_gate_typing_timeouts_total", "Implicit typing stops after inactivity").unwrap();
    pub static ref SLOWMODE_ADMITTED: Counter =
        register_counter!("chat_gate_slowmode_admitted_total", "Messages admitted by slowmode").unwrap();
    pub static ref SLOWMODE_DENIED: Counter =
        register_counter!("chat_gate_slowmode_denied_total", "Messages denied by slowmode").unwrap();
    pub static ref SIGNALS_DROPPED: Counter =
        register_counter!("chat_gate_signals_dropped_total", "Typing signals dropped on a full queue").unwrap();
    pub static ref DELIVERY_FAILURES: Counter =
        register_counter!("chat_gate_delivery_failures_total", "Typing signals the downstream rejected").unwrap();
    pub static ref DELIVERY_LATENCY: Histogram = register_histogram!(
        "chat_gate_delivery_latency_seconds",
        "Downstream typing delivery latency in seconds"
    )
    .unwrap();
    pub static ref TRACKED_KEYS: Gauge =
        register_gauge!("chat_gate_tracked_keys", "Keys currently holding limiter state").unwrap();
}
