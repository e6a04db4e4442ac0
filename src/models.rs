use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GateError;

// Upper bound of the slowmode slider exposed to moderators
pub const MAX_SLOWMODE_SECS: u32 = 300;

/// Identifier under which limiter and timer state is tracked.
///
/// Either a bare user ID (slowmode across a whole scope) or a user+room
/// compound (typing is per room).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    user: String,
    room: Option<String>,
}

impl Key {
    /// Panics on an empty user ID; use [`Key::try_new`] for untrusted input.
    pub fn new(user: impl Into<String>) -> Self {
        let user = user.into();
        assert!(!user.is_empty(), "key user id must not be empty");
        Self { user, room: None }
    }

    pub fn in_room(user: impl Into<String>, room: impl Into<String>) -> Self {
        let mut key = Self::new(user);
        key.room = Some(room.into());
        key
    }

    pub fn try_new(user: &str, room: Option<&str>) -> Result<Self, GateError> {
        if user.trim().is_empty() {
            return Err(GateError::EmptyKey);
        }
        Ok(match room {
            Some(room) if !room.is_empty() => Self::in_room(user, room),
            _ => Self::new(user),
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.room {
            Some(room) => write!(f, "{}@{}", self.user, room),
            None => f.write_str(&self.user),
        }
    }
}

// Outcome of a rate-limit check - a denial carries the whole seconds to wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCheck {
    pub can_send: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<u64>,
}

impl RateCheck {
    pub fn admit() -> Self {
        Self {
            can_send: true,
            time_remaining: None,
        }
    }

    pub fn deny(time_remaining: u64) -> Self {
        Self {
            can_send: false,
            time_remaining: Some(time_remaining),
        }
    }
}

// Typing state change handed to the emission worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingSignal {
    pub key: Key,
    pub typing: bool,
    pub timeout_ms: u64,
}

// Body delivered downstream for every typing signal
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TypingPayload {
    pub user_id: String,
    pub room_id: Option<String>,
    pub typing: bool,
    pub timeout_ms: u64,
    pub sent_at: chrono::DateTime<chrono::Utc>,
}

impl From<&TypingSignal> for TypingPayload {
    fn from(signal: &TypingSignal) -> Self {
        Self {
            user_id: signal.key.user().to_string(),
            room_id: signal.key.room().map(str::to_string),
            typing: signal.typing,
            timeout_ms: signal.timeout_ms,
            sent_at: chrono::Utc::now(),
        }
    }
}

/// Per-room slowmode configuration as set by a moderator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlowmodeSettings {
    pub enabled: bool,
    pub duration_secs: u32,
}

impl SlowmodeSettings {
    pub fn validate(self) -> Result<Self, GateError> {
        if self.duration_secs > MAX_SLOWMODE_SECS {
            return Err(GateError::InvalidSlowmode(self.duration_secs));
        }
        Ok(self)
    }

    // Interval the limiter should enforce; 0 turns slowmode off
    pub fn effective_secs(&self) -> i64 {
        if self.enabled {
            i64::from(self.duration_secs)
        } else {
            0
        }
    }
}

// HTTP request/response bodies

#[derive(Deserialize, Debug, Clone)]
pub struct TypingRequest {
    pub user_id: String,
    pub room_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TypingResponse {
    pub emitted: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SlowmodeCheckRequest {
    pub user_id: String,
    #[serde(default)]
    pub room_id: Option<String>,
    // Explicit interval; overrides the room setting when present
    #[serde(default)]
    pub duration_secs: Option<i64>,
}
