//! # PaperThrow
//!
//! Session backend for the PaperThrow web game.
//!
//! Clients handshake to get a signed session, stream gameplay events, and
//! poll for their results and for the session's wind. Four JSON endpoints,
//! all `POST`:
//!
//! | path          | does                                        |
//! |---------------|---------------------------------------------|
//! | `/handshake`  | issues `sessionToken` + `signature`         |
//! | `/sendEvent`  | records `throw` / `basket_hit` / ...        |
//! | `/getResults` | score, hits, shots, accuracy                |
//! | `/getWind`    | `{x, y, z, strength}` (no `ok` envelope)    |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paperthrow::prelude::*;
//!
//! # async fn run() -> Result<(), PaperthrowError> {
//! let server = PaperthrowServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(Signer::new("deployment-secret")?, MemoryStore::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::{ApiError, PaperthrowError};
pub use server::{PaperthrowServer, PaperthrowServerBuilder};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use paperthrow_protocol::{
        Ack, ErrorBody, EventRequest, HandshakeRequest, HandshakeResponse,
        ResultsResponse, SessionRequest, Wind,
    };
    pub use paperthrow_session::{
        MemoryStore, SessionConfig, SessionError, SessionManager, SessionStore,
        Signer,
    };

    pub use crate::{PaperthrowError, PaperthrowServer, PaperthrowServerBuilder};
}
