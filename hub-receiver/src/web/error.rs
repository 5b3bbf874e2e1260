//! Per-request failures and their HTTP mapping.
//!
//! Every failure ends the request with an explicit status. None of them
//! touch the event log, which is only written once all checks have passed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::handshake::HandshakeRejected;

#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing, malformed or mismatched signature, or an unsupported content type.
    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    HandshakeRejected(#[from] HandshakeRejected),

    /// The payload authenticated but is not a JSON object.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::Unauthorized => StatusCode::UNAUTHORIZED,
            WebhookError::HandshakeRejected(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            WebhookError::InvalidPayload(e) => e.to_string(),
            // Generic text only: never hint which check failed.
            _ => status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
        };

        (status, body).into_response()
    }
}
