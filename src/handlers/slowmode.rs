use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::error::GateError;
use crate::models::{Key, MAX_SLOWMODE_SECS, RateCheck, SlowmodeCheckRequest, SlowmodeSettings};
use crate::state::AppState;

// Explicit duration wins; otherwise the room's configured slowmode applies
pub async fn slowmode_check_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SlowmodeCheckRequest>,
) -> Result<Json<RateCheck>, GateError> {
    let key = Key::try_new(&payload.user_id, payload.room_id.as_deref())?;
    let check = match payload.duration_secs {
        Some(secs) if secs > i64::from(MAX_SLOWMODE_SECS) => {
            return Err(GateError::InvalidSlowmode(u32::try_from(secs).unwrap_or(u32::MAX)));
        }
        Some(secs) => state.slowmode.can_send_message(&key, secs),
        None => state.slowmode.check_room(&key),
    };
    Ok(Json(check))
}

pub async fn set_room_slowmode_handler(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(settings): Json<SlowmodeSettings>,
) -> Result<Json<SlowmodeSettings>, GateError> {
    let settings = state.slowmode.set_room(&room_id, settings)?;
    tracing::info!(room = %room_id, enabled = settings.enabled, duration = settings.duration_secs, "slowmode updated");
    Ok(Json(settings))
}

pub async fn get_room_slowmode_handler(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Json<SlowmodeSettings> {
    Json(state.slowmode.room_settings(&room_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{TypingConfig, TypingSink};
    use std::time::Duration;

    struct NullSink;

    impl TypingSink for NullSink {
        fn emit(&self, _key: &Key, _typing: bool) {}
    }

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(TypingConfig::default(), Arc::new(NullSink)))
    }

    fn check(user: &str, room: Option<&str>, duration_secs: Option<i64>) -> Json<SlowmodeCheckRequest> {
        Json(SlowmodeCheckRequest {
            user_id: user.to_string(),
            room_id: room.map(str::to_string),
            duration_secs,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_duration_denies_then_recovers() {
        let state = state();

        let Json(res) = slowmode_check_handler(State(state.clone()), check("u1", None, Some(10)))
            .await
            .unwrap();
        assert_eq!(res, RateCheck::admit());

        tokio::time::advance(Duration::from_millis(5000)).await;
        let Json(res) = slowmode_check_handler(State(state.clone()), check("u1", None, Some(10)))
            .await
            .unwrap();
        assert_eq!(res, RateCheck::deny(5));

        tokio::time::advance(Duration::from_millis(6000)).await;
        let Json(res) = slowmode_check_handler(State(state), check("u1", None, Some(10)))
            .await
            .unwrap();
        assert!(res.can_send);
    }

    #[tokio::test(start_paused = true)]
    async fn room_setting_applies_without_explicit_duration() {
        let state = state();
        let settings = SlowmodeSettings { enabled: true, duration_secs: 60 };
        set_room_slowmode_handler(State(state.clone()), Path("!r".to_string()), Json(settings))
            .await
            .unwrap();

        let Json(current) = get_room_slowmode_handler(State(state.clone()), Path("!r".to_string())).await;
        assert_eq!(current, settings);

        slowmode_check_handler(State(state.clone()), check("u1", Some("!r"), None))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        let Json(res) = slowmode_check_handler(State(state), check("u1", Some("!r"), None))
            .await
            .unwrap();
        assert_eq!(res, RateCheck::deny(59));
    }

    #[tokio::test]
    async fn explicit_duration_above_slider_range_is_rejected() {
        let state = state();
        let err = slowmode_check_handler(State(state.clone()), check("u1", None, Some(3600)))
            .await
            .unwrap_err();
        assert_eq!(err, GateError::InvalidSlowmode(3600));
        // rejected checks leave no state behind
        assert_eq!(state.slowmode.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn invalid_room_setting_is_rejected() {
        let state = state();
        let settings = SlowmodeSettings { enabled: true, duration_secs: 600 };
        let err = set_room_slowmode_handler(State(state), Path("!r".to_string()), Json(settings))
            .await
            .unwrap_err();
        assert_eq!(err, GateError::InvalidSlowmode(600));
    }
}
