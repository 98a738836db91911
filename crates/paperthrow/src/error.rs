//! Error types for the PaperThrow server.
//!
//! [`PaperthrowError`] is what building and running the server can fail
//! with. [`ApiError`] is what a single request can fail with, and knows
//! how to turn itself into the `{ok: false, error}` HTTP response.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use paperthrow_protocol::ErrorBody;
use paperthrow_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PaperthrowError {
    /// Binding or serving the listener failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A session-level error (secret, storage).
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// A failed request, as seen by the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Any method other than `POST`.
    #[error("POST required")]
    MethodNotAllowed,

    /// No route for this path.
    #[error("Not found")]
    NotFound,

    /// The session layer rejected or failed the request.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    /// HTTP status and client-facing message.
    ///
    /// The message never carries internal detail: all gate failures read
    /// `Invalid session`, and store failures read `Internal error`.
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MethodNotAllowed => (StatusCode::BAD_REQUEST, "POST required"),
            Self::NotFound => (StatusCode::NOT_FOUND, "Not found"),
            Self::Session(SessionError::MissingParameter(_)) => {
                (StatusCode::BAD_REQUEST, "Missing params")
            }
            Self::Session(SessionError::InvalidSession) => {
                (StatusCode::UNAUTHORIZED, "Invalid session")
            }
            Self::Session(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ErrorBody::new(message))).into_response()
    }
}
