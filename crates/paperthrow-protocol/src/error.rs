//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire bodies.
///
/// Each variant wraps the original `serde_json::Error` so the caller can
/// log the exact reason, while still matching on a single error type
/// regardless of which codec produced it.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: a body that is not JSON at all, a JSON array where
    /// an object was expected, or a field of the wrong type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
