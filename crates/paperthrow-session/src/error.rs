//! Error types for the session layer.

/// Errors that can occur while issuing, verifying, or updating sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A required handshake field was absent or empty.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    /// The verification gate rejected the request.
    ///
    /// Covers a missing token or signature, an unknown or expired token,
    /// and a signature mismatch. The cases are deliberately not
    /// distinguished so a caller cannot probe which check failed.
    #[error("invalid session")]
    InvalidSession,

    /// The store already holds a session under this token.
    #[error("session {0} already exists")]
    AlreadyExists(String),

    /// The store holds no session under this token.
    #[error("session not found")]
    NotFound,

    /// The backing store failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The signing secret was rejected (empty or unusable).
    #[error("invalid signing secret: {0}")]
    InvalidSecret(String),
}
