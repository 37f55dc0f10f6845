//! JSON failure payload shared by every endpoint.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// `{"message": ..., "details": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrResponse {
    /// Human-readable summary.
    pub message: String,
    /// Optional supporting detail strings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ErrResponse {
    /// Payload with a message and no details.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Append a detail string.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    /// Render with `status`.
    #[must_use]
    pub fn respond(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }

    /// Render as 401 with a `WWW-Authenticate: Bearer` challenge.
    #[must_use]
    pub fn unauthorized(self) -> Response {
        (StatusCode::UNAUTHORIZED, [(header::WWW_AUTHENTICATE, "Bearer")], Json(self)).into_response()
    }
}
