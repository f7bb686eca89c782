//! Error types for the transport adapter's own I/O boundary, kept separate
//! from `BridgeError` the same way every adapter in this workspace keeps
//! its wire-level failures distinct from the core's domain taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Failures at the telephony WebSocket boundary itself, before a message
/// has been turned into a `TelephonyInboundEvent` (or has any chance to
/// be — a malformed frame never reaches `InputFlow`).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("malformed control message: {0}")]
    MalformedMessage(String),

    #[error("websocket closed")]
    Closed,
}

/// JSON error body for the adapter's plain HTTP routes (currently just
/// `/healthz`, which never actually returns this, but kept for parity with
/// the rest of this workspace's adapters and any future HTTP routes).
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

/// HTTP-facing error type for routes that are not the WebSocket upgrade.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };
        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}
