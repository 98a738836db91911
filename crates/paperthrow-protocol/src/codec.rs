//! Codec trait and the JSON implementation.
//!
//! A codec converts between Rust types and raw bytes. The HTTP layer hands
//! us the raw request body and we decide here how forgiving to be about it.
//! Game clients in the wild send empty bodies, form-encoded junk, or JSON
//! with a stray field type; the endpoints treat all of that as "no
//! parameters" rather than as a transport error, so the client still gets
//! the usual `Missing params` or `Invalid session` envelope.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a single codec instance is shared by
/// every request handler for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or do
    /// not match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Decodes a request body, falling back to `T::default()` when the body
    /// is empty or cannot be decoded.
    ///
    /// Every request type in this crate is all-optional, so the default is
    /// "the client sent nothing", which the session layer then rejects with
    /// its own error.
    fn decode_or_default<T: DeserializeOwned + Default>(&self, data: &[u8]) -> T {
        if data.is_empty() {
            return T::default();
        }
        self.decode(data).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// ## Example
///
/// ```rust
/// use paperthrow_protocol::{Codec, HandshakeRequest, JsonCodec};
///
/// let codec = JsonCodec;
///
/// let body = br#"{"version":"1.0","checksum":"abc","deviceId":"dev1"}"#;
/// let req: HandshakeRequest = codec.decode_or_default(body);
/// assert_eq!(req.version, Some(serde_json::json!("1.0")));
///
/// let junk: HandshakeRequest = codec.decode_or_default(b"version=1.0");
/// assert_eq!(junk, HandshakeRequest::default());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
