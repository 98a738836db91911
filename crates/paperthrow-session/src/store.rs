//! Storage seam for sessions and their events.
//!
//! The backend keeps no state of its own: every session lives in a
//! document store, and the only coordination between concurrent requests
//! is the store's atomic increment. [`SessionStore`] captures exactly the
//! primitives the session protocol needs, so a managed document database
//! can be plugged in without touching the protocol code.
//!
//! [`MemoryStore`] is the in-process implementation used by the server
//! binary and the tests.

use std::collections::{HashMap, HashSet};
use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{Counter, Event, Session, SessionError, SessionUpdate, short_token};

/// Outcome of appending an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appended {
    /// The event was stored.
    Recorded,
    /// The event carried an `event_id` already stored for this session.
    /// Nothing was written.
    Duplicate,
}

/// A document store keyed by session token.
///
/// # Concurrency contract
///
/// [`increment`](Self::increment) must be atomic: concurrent increments to
/// the same counter of the same session are each applied exactly once.
/// Everything else is last-write-wins.
pub trait SessionStore: Send + Sync + 'static {
    /// Persists a new session.
    ///
    /// # Errors
    /// [`SessionError::AlreadyExists`] if the token is taken.
    fn create(
        &self,
        session: Session,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Reads a session.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session has this token.
    fn get(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Session, SessionError>> + Send;

    /// Atomically adds `delta` to a counter and returns the new value.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session has this token.
    fn increment(
        &self,
        token: &str,
        counter: Counter,
        delta: u64,
    ) -> impl Future<Output = Result<u64, SessionError>> + Send;

    /// Overwrites a field unconditionally.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session has this token.
    fn set(
        &self,
        token: &str,
        update: SessionUpdate,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Appends an immutable event under the session.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session has this token.
    fn add_event(
        &self,
        token: &str,
        event: Event,
    ) -> impl Future<Output = Result<Appended, SessionError>> + Send;

    /// Deletes every session created before `cutoff`, along with its
    /// events, and returns the deleted tokens.
    fn expire(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<String>, SessionError>> + Send;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// A session document plus its event subcollection.
#[derive(Debug)]
struct Entry {
    session: Session,
    events: Vec<Event>,
    event_ids: HashSet<String>,
}

/// In-memory [`SessionStore`].
///
/// One mutex guards the whole map. Every operation takes the lock once,
/// so increments are linearizable and an event append with its id check
/// is a single step.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events recorded for a session, oldest first.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session has this token.
    pub async fn events(&self, token: &str) -> Result<Vec<Event>, SessionError> {
        let entries = self.entries.lock().await;
        entries
            .get(token)
            .map(|entry| entry.events.clone())
            .ok_or(SessionError::NotFound)
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns `true` if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl SessionStore for MemoryStore {
    async fn create(&self, session: Session) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&session.token) {
            return Err(SessionError::AlreadyExists(
                short_token(&session.token).to_string(),
            ));
        }
        entries.insert(
            session.token.clone(),
            Entry {
                session,
                events: Vec::new(),
                event_ids: HashSet::new(),
            },
        );
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Session, SessionError> {
        let entries = self.entries.lock().await;
        entries
            .get(token)
            .map(|entry| entry.session.clone())
            .ok_or(SessionError::NotFound)
    }

    async fn increment(
        &self,
        token: &str,
        counter: Counter,
        delta: u64,
    ) -> Result<u64, SessionError> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(token).ok_or(SessionError::NotFound)?;
        let value = entry.session.counter_mut(counter);
        *value = value.saturating_add(delta);
        Ok(*value)
    }

    async fn set(
        &self,
        token: &str,
        update: SessionUpdate,
    ) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(token).ok_or(SessionError::NotFound)?;
        match update {
            SessionUpdate::Score(score) => entry.session.score = score,
            SessionUpdate::LastWind(wind) => entry.session.last_wind = Some(wind),
        }
        Ok(())
    }

    async fn add_event(
        &self,
        token: &str,
        event: Event,
    ) -> Result<Appended, SessionError> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get_mut(token).ok_or(SessionError::NotFound)?;
        if let Some(id) = &event.event_id {
            // `insert` returns false when the id was already present.
            if !entry.event_ids.insert(id.clone()) {
                return Ok(Appended::Duplicate);
            }
        }
        entry.events.push(event);
        Ok(Appended::Recorded)
    }

    async fn expire(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<String>, SessionError> {
        let mut entries = self.entries.lock().await;
        let mut expired = Vec::new();
        entries.retain(|token, entry| {
            if entry.session.created_at < cutoff {
                expired.push(token.clone());
                false
            } else {
                true
            }
        });
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use paperthrow_protocol::Wind;
    use serde_json::json;

    use super::*;

    fn session(token: &str) -> Session {
        Session::new(
            token.to_string(),
            "sig".into(),
            json!("1.0"),
            json!("abc"),
            json!("dev1"),
        )
    }

    fn event(id: Option<&str>) -> Event {
        Event {
            event_type: Some("throw".into()),
            data: None,
            timestamp: json!(1),
            event_id: id.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    // =====================================================================
    // create() / get()
    // =====================================================================

    #[tokio::test]
    async fn test_create_then_get_returns_session() {
        let store = MemoryStore::new();
        store.create(session("tok-a")).await.unwrap();

        let s = store.get("tok-a").await.expect("should exist");

        assert_eq!(s.token, "tok-a");
        assert_eq!(s.device_id, json!("dev1"));
    }

    #[tokio::test]
    async fn test_create_duplicate_token_returns_already_exists() {
        let store = MemoryStore::new();
        store.create(session("tok-a")).await.unwrap();

        let result = store.create(session("tok-a")).await;

        assert!(matches!(result, Err(SessionError::AlreadyExists(_))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_token_returns_not_found() {
        let store = MemoryStore::new();

        assert!(matches!(
            store.get("nope").await,
            Err(SessionError::NotFound)
        ));
    }

    // =====================================================================
    // increment() / set()
    // =====================================================================

    #[tokio::test]
    async fn test_increment_returns_new_value() {
        let store = MemoryStore::new();
        store.create(session("tok-a")).await.unwrap();

        assert_eq!(store.increment("tok-a", Counter::Score, 10).await.unwrap(), 10);
        assert_eq!(store.increment("tok-a", Counter::Score, 10).await.unwrap(), 20);
        assert_eq!(store.get("tok-a").await.unwrap().score, 20);
    }

    #[tokio::test]
    async fn test_increment_unknown_token_returns_not_found() {
        let store = MemoryStore::new();

        let result = store.increment("nope", Counter::Hits, 1).await;

        assert!(matches!(result, Err(SessionError::NotFound)));
    }

    #[tokio::test]
    async fn test_set_score_overwrites_incremented_value() {
        let store = MemoryStore::new();
        store.create(session("tok-a")).await.unwrap();
        store.increment("tok-a", Counter::Score, 30).await.unwrap();

        store.set("tok-a", SessionUpdate::Score(7)).await.unwrap();

        assert_eq!(store.get("tok-a").await.unwrap().score, 7);
    }

    #[tokio::test]
    async fn test_set_last_wind_replaces_previous() {
        let store = MemoryStore::new();
        store.create(session("tok-a")).await.unwrap();
        let w1 = Wind { x: 0.1, y: 0.0, z: 0.1, strength: 1.0 };
        let w2 = Wind { x: -0.1, y: 0.0, z: 0.0, strength: 1.5 };

        store.set("tok-a", SessionUpdate::LastWind(w1)).await.unwrap();
        store.set("tok-a", SessionUpdate::LastWind(w2)).await.unwrap();

        assert_eq!(store.get("tok-a").await.unwrap().last_wind, Some(w2));
    }

    // =====================================================================
    // add_event()
    // =====================================================================

    #[tokio::test]
    async fn test_add_event_without_id_always_records() {
        let store = MemoryStore::new();
        store.create(session("tok-a")).await.unwrap();

        store.add_event("tok-a", event(None)).await.unwrap();
        store.add_event("tok-a", event(None)).await.unwrap();

        assert_eq!(store.events("tok-a").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_add_event_repeated_id_returns_duplicate() {
        let store = MemoryStore::new();
        store.create(session("tok-a")).await.unwrap();

        let first = store.add_event("tok-a", event(Some("e1"))).await.unwrap();
        let second = store.add_event("tok-a", event(Some("e1"))).await.unwrap();

        assert_eq!(first, Appended::Recorded);
        assert_eq!(second, Appended::Duplicate);
        assert_eq!(store.events("tok-a").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_event_same_id_different_sessions_both_record() {
        let store = MemoryStore::new();
        store.create(session("tok-a")).await.unwrap();
        store.create(session("tok-b")).await.unwrap();

        let a = store.add_event("tok-a", event(Some("e1"))).await.unwrap();
        let b = store.add_event("tok-b", event(Some("e1"))).await.unwrap();

        assert_eq!((a, b), (Appended::Recorded, Appended::Recorded));
    }

    // =====================================================================
    // expire()
    // =====================================================================

    #[tokio::test]
    async fn test_expire_removes_only_older_sessions() {
        let store = MemoryStore::new();
        let mut old = session("tok-old");
        old.created_at = Utc::now() - TimeDelta::try_hours(2).unwrap();
        store.create(old).await.unwrap();
        store.create(session("tok-new")).await.unwrap();

        let cutoff = Utc::now() - TimeDelta::try_hours(1).unwrap();
        let expired = store.expire(cutoff).await.unwrap();

        assert_eq!(expired, vec!["tok-old".to_string()]);
        assert!(store.get("tok-old").await.is_err());
        assert!(store.get("tok-new").await.is_ok());
    }

    #[tokio::test]
    async fn test_expire_empty_store_returns_nothing() {
        let store = MemoryStore::new();

        assert!(store.expire(Utc::now()).await.unwrap().is_empty());
        assert!(store.is_empty().await);
    }
}
