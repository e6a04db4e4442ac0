use axum::{Json, extract::State};
use std::sync::Arc;

use crate::error::GateError;
use crate::models::{Key, TypingRequest, TypingResponse};
use crate::state::AppState;

pub async fn start_typing_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TypingRequest>,
) -> Result<Json<TypingResponse>, GateError> {
    let key = Key::try_new(&payload.user_id, Some(&payload.room_id))?;
    let emitted = state.typing.start_typing(&key);
    Ok(Json(TypingResponse { emitted }))
}

pub async fn stop_typing_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TypingRequest>,
) -> Result<Json<TypingResponse>, GateError> {
    let key = Key::try_new(&payload.user_id, Some(&payload.room_id))?;
    let emitted = state.typing.stop_typing(&key);
    Ok(Json(TypingResponse { emitted }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::TypingConfig;
    use crate::models::TypingSignal;
    use crate::worker::ChannelSink;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn state() -> (Arc<AppState>, mpsc::Receiver<TypingSignal>) {
        let (tx, rx) = mpsc::channel(16);
        let config = TypingConfig::default();
        let sink = Arc::new(ChannelSink::new(tx, config.timeout));
        (Arc::new(AppState::new(config, sink)), rx)
    }

    fn request(user: &str) -> Json<TypingRequest> {
        Json(TypingRequest {
            user_id: user.to_string(),
            room_id: "!room:hs".to_string(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn start_then_immediate_stop() {
        let (state, mut rx) = state();

        let Json(res) = start_typing_handler(State(state.clone()), request("@u1:hs"))
            .await
            .unwrap();
        assert!(res.emitted);

        let Json(res) = stop_typing_handler(State(state.clone()), request("@u1:hs"))
            .await
            .unwrap();
        assert!(!res.emitted);

        let signal = rx.recv().await.unwrap();
        assert_eq!(signal.key, Key::in_room("@u1:hs", "!room:hs"));
        assert!(signal.typing);
        assert!(rx.try_recv().is_err());

        // implicit stop once the timer runs out
        tokio::time::advance(Duration::from_millis(5000)).await;
        let signal = rx.recv().await.unwrap();
        assert!(!signal.typing);

        // the implicit stop restarted the window
        tokio::time::advance(Duration::from_millis(1000)).await;
        let Json(res) = start_typing_handler(State(state.clone()), request("@u1:hs"))
            .await
            .unwrap();
        assert!(!res.emitted);

        tokio::time::advance(Duration::from_millis(4000)).await;
        let Json(res) = start_typing_handler(State(state), request("@u1:hs"))
            .await
            .unwrap();
        assert!(res.emitted);
    }

    #[tokio::test]
    async fn empty_user_is_rejected() {
        let (state, _rx) = state();
        let err = start_typing_handler(State(state), request(""))
            .await
            .unwrap_err();
        assert_eq!(err, GateError::EmptyKey);
    }
}
