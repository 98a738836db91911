//! Session records and configuration.
//!
//! A session is the server's record of one play-through: who started it
//! (opaque client metadata), how it is authenticated (token + signature),
//! and what has happened so far (throws, hits, score, last wind).

use chrono::{DateTime, TimeDelta, Utc};
use paperthrow_protocol::Wind;
use serde_json::Value;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session lifetime.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long (in seconds) a session stays valid after its handshake.
    ///
    /// `None` keeps sessions forever, which is what the deployed game
    /// expects. With a TTL set, expired sessions fail verification and
    /// are removed by the periodic sweep.
    pub session_ttl_secs: Option<u64>,

    /// How often (in seconds) the sweep runs when a TTL is configured.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: None,
            sweep_interval_secs: 60,
        }
    }
}

impl SessionConfig {
    /// The TTL as a time delta, if one is configured and representable.
    pub fn ttl(&self) -> Option<TimeDelta> {
        let secs = i64::try_from(self.session_ttl_secs?).ok()?;
        TimeDelta::try_seconds(secs)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One client's play session as held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Primary key and bearer credential. 32 lowercase hex characters.
    pub token: String,

    /// HMAC of `token`, issued at handshake.
    pub signature: String,

    /// Client build version, stored verbatim.
    pub version: Value,

    /// Client build checksum, stored verbatim.
    pub checksum: Value,

    /// Client device identifier, stored verbatim.
    pub device_id: Value,

    pub hits: u64,
    pub throws: u64,
    pub score: u64,

    /// The most recent wind handed out for this session.
    pub last_wind: Option<Wind>,

    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session with all counters at zero.
    pub fn new(
        token: String,
        signature: String,
        version: Value,
        checksum: Value,
        device_id: Value,
    ) -> Self {
        Self {
            token,
            signature,
            version,
            checksum,
            device_id,
            hits: 0,
            throws: 0,
            score: 0,
            last_wind: None,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if the session is older than `ttl` at `now`.
    pub fn is_expired(&self, ttl: TimeDelta, now: DateTime<Utc>) -> bool {
        self.created_at
            .checked_add_signed(ttl)
            .is_some_and(|deadline| deadline < now)
    }

    /// Reads one of the aggregate counters.
    pub fn counter(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Hits => self.hits,
            Counter::Throws => self.throws,
            Counter::Score => self.score,
        }
    }

    pub(crate) fn counter_mut(&mut self, counter: Counter) -> &mut u64 {
        match counter {
            Counter::Hits => &mut self.hits,
            Counter::Throws => &mut self.throws,
            Counter::Score => &mut self.score,
        }
    }
}

/// The numeric fields that support atomic increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Hits,
    Throws,
    Score,
}

/// An unconditional overwrite of one session field. Last write wins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionUpdate {
    /// Replace the score with a client-reported total.
    Score(u64),
    /// Cache the most recently derived wind.
    LastWind(Wind),
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// An immutable gameplay event recorded under a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Raw event type as sent by the client (absent if the client sent none).
    pub event_type: Option<String>,

    /// Opaque payload.
    pub data: Option<Value>,

    /// Client timestamp, or server time in epoch milliseconds.
    pub timestamp: Value,

    /// Client idempotency key, if any.
    pub event_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn session() -> Session {
        Session::new(
            "t".repeat(32),
            "s".repeat(64),
            json!("1.0"),
            json!("abc"),
            json!("dev1"),
        )
    }

    #[test]
    fn test_new_session_counters_are_zero() {
        let s = session();

        assert_eq!((s.hits, s.throws, s.score), (0, 0, 0));
        assert!(s.last_wind.is_none());
    }

    #[test]
    fn test_counter_mut_targets_named_field() {
        let mut s = session();

        *s.counter_mut(Counter::Throws) += 3;
        *s.counter_mut(Counter::Score) += 10;

        assert_eq!(s.counter(Counter::Throws), 3);
        assert_eq!(s.counter(Counter::Score), 10);
        assert_eq!(s.counter(Counter::Hits), 0);
    }

    #[test]
    fn test_is_expired_respects_ttl() {
        let s = session();
        let ttl = TimeDelta::try_seconds(60).unwrap();

        assert!(!s.is_expired(ttl, s.created_at));
        assert!(s.is_expired(ttl, s.created_at + TimeDelta::try_seconds(61).unwrap()));
    }

    #[test]
    fn test_config_default_has_no_ttl() {
        let cfg = SessionConfig::default();

        assert_eq!(cfg.session_ttl_secs, None);
        assert_eq!(cfg.ttl(), None);
        assert_eq!(cfg.sweep_interval_secs, 60);
    }

    #[test]
    fn test_config_ttl_converts_seconds() {
        let cfg = SessionConfig {
            session_ttl_secs: Some(3600),
            ..SessionConfig::default()
        };

        assert_eq!(cfg.ttl(), TimeDelta::try_seconds(3600));
    }

    #[test]
    fn test_config_ttl_out_of_range_is_none() {
        let cfg = SessionConfig {
            session_ttl_secs: Some(u64::MAX),
            ..SessionConfig::default()
        };

        assert_eq!(cfg.ttl(), None);
    }
}
