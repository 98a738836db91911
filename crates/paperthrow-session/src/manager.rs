//! The session protocol: handshake, verification, and the three
//! authenticated operations.
//!
//! `SessionManager` owns the signer and the store and is shared by every
//! request handler. It holds no mutable state of its own; all mutation
//! goes through the store, and concurrent requests for the same session
//! only meet at the store's atomic increment.
//!
//! ## Lifecycle
//!
//! ```text
//! handshake() ──→ [session stored, counters = 0]
//!                      │
//!      ┌───────────────┼────────────────┐
//!      ▼               ▼                ▼
//! record_event()   results()          wind()
//!   (verify)       (verify)          (verify)
//!      │                                │
//!      ▼                                ▼
//!  counters++ / score=               lastWind=
//!                      │
//!                      ▼ (TTL configured, session too old)
//!                expire_stale()
//! ```
//!
//! # Known limitation
//!
//! Without an `eventId`, event recording is not idempotent: a client that
//! retries a `basket_hit` after a timeout is credited twice.

use chrono::Utc;
use paperthrow_protocol::{
    Codec, EventKind, EventRequest, HandshakeRequest, HandshakeResponse,
    JsonCodec, ResultsResponse, SessionRequest, Wind, is_truthy,
};
use rand::Rng;
use serde_json::Value;

use crate::{
    Appended, Counter, Event, Session, SessionConfig, SessionError,
    SessionStore, SessionUpdate, Signer, short_token,
};

/// Points credited for each `basket_hit`.
pub const POINTS_PER_HIT: u64 = 10;

/// What happened to a submitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Stored and applied to the aggregates.
    Recorded,
    /// Its `eventId` was already seen; nothing changed.
    Duplicate,
}

/// Issues sessions and runs the authenticated operations against a store.
pub struct SessionManager<S: SessionStore> {
    store: S,
    signer: Signer,
    config: SessionConfig,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S, signer: Signer, config: SessionConfig) -> Self {
        Self {
            store,
            signer,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Consumes the manager and hands back its store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Starts a new session.
    ///
    /// # Errors
    /// - [`SessionError::MissingParameter`] if `version`, `checksum` or
    ///   `deviceId` is absent or falsy.
    /// - [`SessionError::AlreadyExists`] on a token collision (not retried).
    /// - Any store failure.
    pub async fn handshake(
        &self,
        req: HandshakeRequest,
    ) -> Result<HandshakeResponse, SessionError> {
        let version = required(req.version, "version")?;
        let checksum = required(req.checksum, "checksum")?;
        let device_id = required(req.device_id, "deviceId")?;

        let token = generate_token();
        let signature = self.signer.sign(&token);

        self.store
            .create(Session::new(
                token.clone(),
                signature.clone(),
                version,
                checksum,
                device_id,
            ))
            .await?;

        tracing::info!(token = short_token(&token), "session created");

        Ok(HandshakeResponse {
            ok: true,
            session_token: token,
            signature,
        })
    }

    /// The verification gate shared by every authenticated operation.
    ///
    /// Returns the stored session if the token exists, has not outlived
    /// the configured TTL, and the signature matches.
    ///
    /// # Errors
    /// [`SessionError::InvalidSession`] for every rejection; store
    /// failures other than "not found" pass through unchanged.
    pub async fn verify(
        &self,
        creds: &SessionRequest,
    ) -> Result<Session, SessionError> {
        let (Some(token), Some(signature)) = (
            non_empty(creds.session_token.as_deref()),
            non_empty(creds.client_signature.as_deref()),
        ) else {
            tracing::debug!("rejected request without credentials");
            return Err(SessionError::InvalidSession);
        };

        let session = match self.store.get(token).await {
            Ok(session) => session,
            Err(SessionError::NotFound) => {
                tracing::debug!("rejected unknown session token");
                return Err(SessionError::InvalidSession);
            }
            Err(e) => return Err(e),
        };

        if let Some(ttl) = self.config.ttl() {
            if session.is_expired(ttl, Utc::now()) {
                tracing::debug!(token = short_token(token), "rejected expired session");
                return Err(SessionError::InvalidSession);
            }
        }

        if !self.signer.verify(token, signature) {
            tracing::debug!(token = short_token(token), "rejected bad signature");
            return Err(SessionError::InvalidSession);
        }

        Ok(session)
    }

    /// Records a gameplay event and applies its effect on the aggregates.
    ///
    /// | event type     | effect                                   |
    /// |----------------|------------------------------------------|
    /// | `throw`        | `throws += 1`                            |
    /// | `basket_hit`   | `hits += 1`, `score += 10`               |
    /// | `score_update` | `score = data.totalScore` if well-formed |
    /// | anything else  | none                                     |
    ///
    /// A malformed `score_update` payload is ignored, not reported.
    ///
    /// # Errors
    /// [`SessionError::InvalidSession`] from the gate, or a store failure.
    pub async fn record_event(
        &self,
        req: EventRequest,
    ) -> Result<RecordOutcome, SessionError> {
        let session = self.verify(&req.credentials).await?;
        let token = session.token.as_str();

        let kind = req.event_type.as_deref().map(EventKind::parse);
        let timestamp = req
            .timestamp
            .filter(is_truthy)
            .unwrap_or_else(|| Value::from(Utc::now().timestamp_millis()));

        let event = Event {
            event_type: req.event_type.clone(),
            data: req.data.clone(),
            timestamp,
            event_id: req.event_id.clone(),
            created_at: Utc::now(),
        };

        let appended = self.store.add_event(token, event).await.map_err(swept)?;
        if appended == Appended::Duplicate {
            tracing::debug!(
                token = short_token(token),
                event_id = req.event_id.as_deref().unwrap_or_default(),
                "duplicate event ignored"
            );
            return Ok(RecordOutcome::Duplicate);
        }

        match kind {
            Some(EventKind::Throw) => {
                self.store
                    .increment(token, Counter::Throws, 1)
                    .await
                    .map_err(swept)?;
            }
            Some(EventKind::BasketHit) => {
                // Two separate increments. A crash between them leaves a
                // hit without its points.
                self.store
                    .increment(token, Counter::Hits, 1)
                    .await
                    .map_err(swept)?;
                self.store
                    .increment(token, Counter::Score, POINTS_PER_HIT)
                    .await
                    .map_err(swept)?;
            }
            Some(EventKind::ScoreUpdate) => {
                match req.data.as_ref().filter(|d| is_truthy(d)).and_then(total_score) {
                    Some(total) => {
                        self.store
                            .set(token, SessionUpdate::Score(total))
                            .await
                            .map_err(swept)?;
                    }
                    None => {
                        tracing::debug!(
                            token = short_token(token),
                            "ignoring malformed score_update payload"
                        );
                    }
                }
            }
            Some(EventKind::Other(_)) | None => {}
        }

        tracing::debug!(
            token = short_token(token),
            event_type = kind.as_ref().map(EventKind::as_str).unwrap_or_default(),
            "event recorded"
        );
        Ok(RecordOutcome::Recorded)
    }

    /// Aggregated results for a session.
    ///
    /// `accuracy` is `hits / throws`, or `0` before the first throw. A
    /// zero stored score falls back to `hits * 10`.
    ///
    /// # Errors
    /// [`SessionError::InvalidSession`] from the gate, or a store failure.
    pub async fn results(
        &self,
        creds: &SessionRequest,
    ) -> Result<ResultsResponse, SessionError> {
        let session = self.verify(creds).await?;

        let accuracy = if session.throws > 0 {
            session.hits as f64 / session.throws as f64
        } else {
            0.0
        };
        let score = if session.score != 0 {
            session.score
        } else {
            session.hits.saturating_mul(POINTS_PER_HIT)
        };

        Ok(ResultsResponse {
            ok: true,
            score,
            hits: session.hits,
            shots: session.throws,
            accuracy,
            time_taken: 0,
        })
    }

    /// Derives the session's wind and caches it as `lastWind`.
    ///
    /// # Errors
    /// [`SessionError::InvalidSession`] from the gate, or a store failure.
    pub async fn wind(&self, creds: &SessionRequest) -> Result<Wind, SessionError> {
        let session = self.verify(creds).await?;

        let wind = paperthrow_wind::derive_wind(&session.token);
        self.store
            .set(&session.token, SessionUpdate::LastWind(wind))
            .await
            .map_err(swept)?;

        Ok(wind)
    }

    /// Deletes sessions older than the configured TTL.
    ///
    /// Returns the deleted tokens. Does nothing when no TTL is configured.
    ///
    /// # Errors
    /// Store failures.
    pub async fn expire_stale(&self) -> Result<Vec<String>, SessionError> {
        let Some(ttl) = self.config.ttl() else {
            return Ok(Vec::new());
        };
        let Some(cutoff) = Utc::now().checked_sub_signed(ttl) else {
            return Ok(Vec::new());
        };

        let expired = self.store.expire(cutoff).await?;
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "expired stale sessions");
        }
        Ok(expired)
    }
}

/// Generates a random 32-character hex token (128 bits of entropy).
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

/// A session can be swept between the gate and the write that follows
/// it. To the client that is the same as never having had the session.
fn swept(err: SessionError) -> SessionError {
    match err {
        SessionError::NotFound => SessionError::InvalidSession,
        other => other,
    }
}

fn required(value: Option<Value>, name: &'static str) -> Result<Value, SessionError> {
    value
        .filter(is_truthy)
        .ok_or(SessionError::MissingParameter(name))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Extracts `totalScore` from a `score_update` payload.
///
/// The payload is normally a JSON-encoded string; an already-decoded
/// object is accepted too. Only non-negative whole numbers count.
fn total_score(data: &Value) -> Option<u64> {
    let parsed: Value = match data {
        Value::String(raw) => JsonCodec.decode(raw.as_bytes()).ok()?,
        Value::Object(_) => data.clone(),
        _ => return None,
    };
    whole_number(parsed.get("totalScore")?)
}

fn whole_number(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    // 2^64 as f64; anything at or above it does not fit.
    const LIMIT: f64 = 18_446_744_073_709_551_616.0;
    value
        .as_f64()
        .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f < LIMIT)
        .map(|f| f as u64)
}

// =========================================================================
// Tests
// =========================================================================
