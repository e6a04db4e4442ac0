mod health;
mod metrics;
mod slowmode;
mod typing;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::state::AppState;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use slowmode::{get_room_slowmode_handler, set_room_slowmode_handler, slowmode_check_handler};
pub use typing::{start_typing_handler, stop_typing_handler};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/typing/start", post(start_typing_handler))
        .route("/typing/stop", post(stop_typing_handler))
        .route("/slowmode/check", post(slowmode_check_handler))
        .route(
            "/rooms/{room_id}/slowmode",
            get(get_room_slowmode_handler).put(set_room_slowmode_handler),
        )
        .with_state(state)
}
