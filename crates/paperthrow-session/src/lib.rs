//! Session management for PaperThrow.
//!
//! This crate is the heart of the backend:
//!
//! 1. **Signing** ([`Signer`]): HMAC over the session token, so a client
//!    can prove it was issued the token without sending a secret back.
//! 2. **Storage** ([`SessionStore`] trait, [`MemoryStore`]): the document
//!    store the sessions live in, reduced to create / get / atomic
//!    increment / overwrite / append-event.
//! 3. **Protocol** ([`SessionManager`]): handshake, the verification gate,
//!    and the three authenticated operations built on top of it.
//!
//! # How it fits in the stack
//!
//! ```text
//! HTTP layer (above)      ← maps requests to SessionManager calls
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol + Wind (below) ← request/response shapes, wind derivation
//! ```

mod error;
mod manager;
mod session;
mod signer;
mod store;

pub use error::SessionError;
pub use manager::{RecordOutcome, SessionManager};
pub use session::{Counter, Event, Session, SessionConfig, SessionUpdate};
pub use signer::Signer;
pub use store::{Appended, MemoryStore, SessionStore};

/// Shortens a token for log output.
///
/// Full tokens are bearer credentials and never go to the logs.
pub(crate) fn short_token(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}
