use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};

use crate::models::MAX_SLOWMODE_SECS;

// Errors raised at the request boundary. Rate-limit denials are not errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GateError {
    #[error("user id must not be empty")]
    EmptyKey,
    #[error("slowmode duration {0}s is out of range (0-{max}s)", max = MAX_SLOWMODE_SECS)]
    InvalidSlowmode(u32),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
