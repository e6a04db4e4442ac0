use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use crate::gate::TypingSink;
use crate::metrics::{DELIVERY_FAILURES, DELIVERY_LATENCY, SIGNALS_DROPPED};
use crate::models::{Key, TypingPayload, TypingSignal};

// Sink that queues typing signals for the delivery worker without waiting
pub struct ChannelSink {
    tx: mpsc::Sender<TypingSignal>,
    timeout_ms: u64,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<TypingSignal>, typing_timeout: Duration) -> Self {
        Self {
            tx,
            timeout_ms: typing_timeout.as_millis() as u64,
        }
    }
}

impl TypingSink for ChannelSink {
    fn emit(&self, key: &Key, typing: bool) {
        let signal = TypingSignal {
            key: key.clone(),
            typing,
            timeout_ms: self.timeout_ms,
        };
        match self.tx.try_send(signal) {
            Ok(()) => {}
            Err(TrySendError::Full(signal)) => {
                SIGNALS_DROPPED.inc();
                warn!(key = %signal.key, typing, "typing queue full, signal dropped");
            }
            Err(TrySendError::Closed(_)) => {
                SIGNALS_DROPPED.inc();
                warn!(%key, "delivery worker gone, signal dropped");
            }
        }
    }
}

// Delivery worker -> posts queued typing signals downstream one by one.
// Failures are logged and counted; nothing is retried.
pub async fn delivery_worker(
    mut rx: mpsc::Receiver<TypingSignal>,
    client: reqwest::Client,
    emit_url: Option<String>,
) {
    match &emit_url {
        Some(url) => info!("Delivery worker started, forwarding to {}", url),
        None => info!("Delivery worker started, no emit url - signals are logged only"),
    }

    while let Some(signal) = rx.recv().await {
        let Some(url) = emit_url.as_deref() else {
            info!(key = %signal.key, typing = signal.typing, "typing signal");
            continue;
        };

        let payload = TypingPayload::from(&signal);
        let start_time = Instant::now();

        let result = client
            .post(url)
            .json(&payload)
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match result {
            Ok(res) if res.status().is_success() => {
                DELIVERY_LATENCY.observe(start_time.elapsed().as_secs_f64());
                debug!(key = %signal.key, typing = signal.typing, "typing signal delivered");
            }
            Ok(res) => {
                DELIVERY_FAILURES.inc();
                warn!(key = %signal.key, status = %res.status(), "downstream rejected typing signal");
            }
            Err(e) => {
                DELIVERY_FAILURES.inc();
                warn!(key = %signal.key, "typing delivery failed: {}", e);
            }
        }
    }

    info!("Delivery worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sink_queues_signal_with_timeout() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = ChannelSink::new(tx, Duration::from_millis(5000));
        let key = Key::in_room("u1", "!room");

        sink.emit(&key, true);
        let signal = rx.recv().await.unwrap();
        assert_eq!(
            signal,
            TypingSignal { key, typing: true, timeout_ms: 5000 }
        );
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let sink = ChannelSink::new(tx, Duration::from_millis(5000));
        let key = Key::new("u1");

        sink.emit(&key, true);
        sink.emit(&key, false);

        assert!(rx.recv().await.unwrap().typing);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_queue_is_tolerated() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sink = ChannelSink::new(tx, Duration::from_millis(5000));
        sink.emit(&Key::new("u1"), true);
    }

    #[tokio::test]
    async fn worker_drains_queue_and_exits_when_senders_close() {
        let (tx, rx) = mpsc::channel(8);
        let sink = ChannelSink::new(tx, Duration::from_millis(5000));
        sink.emit(&Key::new("u1"), true);
        sink.emit(&Key::new("u1"), false);
        drop(sink);

        let worker = tokio::spawn(delivery_worker(rx, reqwest::Client::new(), None));
        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .expect("worker should stop once the queue closes")
            .unwrap();
    }
}
