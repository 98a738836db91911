//! Wire protocol for PaperThrow.
//!
//! This crate defines what travels between the game client and the
//! session backend:
//!
//! - **Types** ([`HandshakeRequest`], [`EventRequest`], [`Wind`], etc.):
//!   the JSON bodies of the four endpoints.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those bodies are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about HTTP or storage. It only knows
//! the shape of each request and response.
//!
//! ```text
//! HTTP (bytes) → Protocol (request structs) → Session (verified session)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    Ack, ErrorBody, EventKind, EventRequest, HandshakeRequest,
    HandshakeResponse, ResultsResponse, SessionRequest, Wind, is_truthy,
};
