//! Error responses of the API and failures of the server itself

use std::net::SocketAddr;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nfc_bridge_core::WaitError;
use serde::Serialize;

/// Failure of a wait request, rendered as a status code and `{error}` body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiError(WaitError);

impl ApiError {
    /// Status code sent for this failure
    pub const fn status(&self) -> StatusCode {
        match self.0 {
            WaitError::ReaderNotReady => StatusCode::SERVICE_UNAVAILABLE,
            WaitError::BridgeDisabled => StatusCode::LOCKED,
            WaitError::Timeout => StatusCode::REQUEST_TIMEOUT,
            WaitError::ReaderRemoved | WaitError::Abandoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `error` field
    pub const fn message(&self) -> &'static str {
        match self.0 {
            WaitError::ReaderNotReady => "reader not ready",
            WaitError::BridgeDisabled => "bridge disabled",
            WaitError::Timeout => "timeout",
            WaitError::ReaderRemoved | WaitError::Abandoned => "failed",
        }
    }
}

impl From<WaitError> for ApiError {
    fn from(error: WaitError) -> Self {
        Self(error)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: self.message(),
            }),
        )
            .into_response()
    }
}

/// Errors starting or running the HTTP server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The API may only listen on the loopback interface
    #[error("refusing to listen on non-loopback address {0}")]
    NotLoopback(SocketAddr),

    /// Binding or serving failed
    #[error("http server error: {0}")]
    Io(#[from] std::io::Error),
}
