use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_gate::config::Args;
use chat_gate::handlers::router;
use chat_gate::models::TypingSignal;
use chat_gate::state::AppState;
use chat_gate::sweeper::idle_sweeper;
use chat_gate::worker::{ChannelSink, delivery_worker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let typing_config = args.typing_config();
    let (signal_tx, signal_rx) = mpsc::channel::<TypingSignal>(args.emit_queue.max(1));

    let sink = Arc::new(ChannelSink::new(signal_tx, typing_config.timeout));
    let state = Arc::new(AppState::new(typing_config, sink));

    // spawn the delivery worker
    tokio::spawn(delivery_worker(signal_rx, reqwest::Client::new(), args.emit_url.clone()));

    // spawn the idle sweeper
    tokio::spawn(idle_sweeper(
        Arc::clone(&state),
        Duration::from_secs(args.sweep_interval),
        Duration::from_secs(args.idle_ttl),
    ));

    let app = router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Gate running on http://localhost:{}", args.port);
    info!(
        "Typing: {}s rate limit, {}ms inactivity timeout",
        typing_config.rate_limit_secs,
        typing_config.timeout.as_millis()
    );
    info!("Idle keys evicted after {} seconds", args.idle_ttl);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
