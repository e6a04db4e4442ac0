use clap::Parser;
use std::time::Duration;

use crate::gate::TypingConfig;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-gate")]
#[command(about = "Typing indicator and slowmode gate for chat front-ends")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Minimum seconds between emitted typing start/stop signals per user+room
    #[arg(long, default_value_t = 5)]
    pub rate_limit_secs: i64,

    // Inactivity before an implicit typing stop, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub typing_timeout_ms: u64,

    // Send the implicit stop even when it falls inside the rate window
    #[arg(long)]
    pub timeout_bypasses_limit: bool,

    // Where typing signals are delivered (logged only when unset)
    // Example: "http://localhost:9000/typing"
    #[arg(short, long)]
    pub emit_url: Option<String>,

    // Capacity of the typing signal queue
    #[arg(long, default_value_t = 256)]
    pub emit_queue: usize,

    // Idle-state sweep interval in seconds
    #[arg(long, default_value_t = 60)]
    pub sweep_interval: u64,

    // Drop limiter state for keys idle longer than this, in seconds
    #[arg(long, default_value_t = 600)]
    pub idle_ttl: u64,
}

impl Args {
    pub fn typing_config(&self) -> TypingConfig {
        TypingConfig {
            rate_limit_secs: self.rate_limit_secs,
            timeout: Duration::from_millis(self.typing_timeout_ms),
            timeout_bypasses_limit: self.timeout_bypasses_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_couple_rate_and_timeout_at_five_seconds() {
        let args = Args::parse_from(["chat-gate"]);
        let typing = args.typing_config();
        assert_eq!(typing.rate_limit_secs, 5);
        assert_eq!(typing.timeout, Duration::from_secs(5));
        assert!(!typing.timeout_bypasses_limit);
        assert_eq!(args.emit_url, None);
    }

    #[test]
    fn rate_and_timeout_are_independent() {
        let args = Args::parse_from([
            "chat-gate",
            "--rate-limit-secs",
            "2",
            "--typing-timeout-ms",
            "8000",
            "--timeout-bypasses-limit",
            "--emit-url",
            "http://localhost:9000/typing",
        ]);
        let typing = args.typing_config();
        assert_eq!(typing.rate_limit_secs, 2);
        assert_eq!(typing.timeout, Duration::from_millis(8000));
        assert!(typing.timeout_bypasses_limit);
        assert_eq!(args.emit_url.as_deref(), Some("http://localhost:9000/typing"));
    }
}
