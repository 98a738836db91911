//! Integration tests for event aggregation, including concurrent writers.
//!
//! Every test drives the public `SessionManager` API only. Concurrency
//! tests run on a multi-threaded runtime so tasks genuinely interleave
//! inside the store.

use std::sync::Arc;

use paperthrow_protocol::{EventRequest, HandshakeRequest, SessionRequest};
use paperthrow_session::{
    MemoryStore, SessionConfig, SessionError, SessionManager, SessionStore,
    Signer,
};
use serde_json::json;

// =========================================================================
// Helpers
// =========================================================================

fn manager() -> Arc<SessionManager<MemoryStore>> {
    Arc::new(SessionManager::new(
        MemoryStore::new(),
        Signer::new("integration-secret").expect("valid secret"),
        SessionConfig::default(),
    ))
}

async fn start(mgr: &SessionManager<MemoryStore>) -> SessionRequest {
    let ack = mgr
        .handshake(HandshakeRequest {
            version: Some(json!("1.0")),
            checksum: Some(json!("abc")),
            device_id: Some(json!("dev1")),
        })
        .await
        .expect("handshake");
    SessionRequest {
        session_token: Some(ack.session_token),
        client_signature: Some(ack.signature),
    }
}

fn event(creds: &SessionRequest, kind: &str) -> EventRequest {
    EventRequest {
        credentials: creds.clone(),
        event_type: Some(kind.to_string()),
        ..EventRequest::default()
    }
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_events_lose_no_updates() {
    const THROWS: u64 = 200;
    const HITS: u64 = 150;

    let mgr = manager();
    let creds = start(&mgr).await;

    // Interleave both kinds so they hit the store at the same time.
    let mut tasks = Vec::new();
    for i in 0..THROWS.max(HITS) {
        for (kind, limit) in [("throw", THROWS), ("basket_hit", HITS)] {
            if i < limit {
                let mgr = Arc::clone(&mgr);
                let req = event(&creds, kind);
                tasks.push(tokio::spawn(async move { mgr.record_event(req).await }));
            }
        }
    }
    for task in tasks {
        task.await.expect("task panicked").expect("record_event");
    }

    let results = mgr.results(&creds).await.expect("results");
    assert_eq!(results.shots, THROWS);
    assert_eq!(results.hits, HITS);
    assert_eq!(results.score, HITS * 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_stay_independent() {
    let mgr = manager();
    let a = start(&mgr).await;
    let b = start(&mgr).await;

    let mut tasks = Vec::new();
    for _ in 0..50 {
        for (creds, kind) in [(&a, "throw"), (&b, "basket_hit")] {
            let mgr = Arc::clone(&mgr);
            let req = event(creds, kind);
            tasks.push(tokio::spawn(async move { mgr.record_event(req).await }));
        }
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let ra = mgr.results(&a).await.unwrap();
    let rb = mgr.results(&b).await.unwrap();
    assert_eq!((ra.shots, ra.hits, ra.score), (50, 0, 0));
    assert_eq!((rb.shots, rb.hits, rb.score), (0, 50, 500));
    assert_eq!(rb.accuracy, 0.0);
}

// =========================================================================
// Full scenario
// =========================================================================

#[tokio::test]
async fn test_scenario_three_throws_two_hits() {
    let mgr = manager();
    let creds = start(&mgr).await;

    for _ in 0..3 {
        mgr.record_event(event(&creds, "throw")).await.unwrap();
    }
    for _ in 0..2 {
        mgr.record_event(event(&creds, "basket_hit")).await.unwrap();
    }

    let r = mgr.results(&creds).await.unwrap();
    assert_eq!(r.score, 20);
    assert_eq!(r.hits, 2);
    assert_eq!(r.shots, 3);
    assert!((r.accuracy - 0.666_666).abs() < 1e-5);
    assert_eq!(r.time_taken, 0);
}

#[tokio::test]
async fn test_score_update_then_hit_increments_from_reported_total() {
    let mgr = manager();
    let creds = start(&mgr).await;
    let mut update = event(&creds, "score_update");
    update.data = Some(json!("{\"totalScore\":42}"));

    mgr.record_event(update).await.unwrap();
    mgr.record_event(event(&creds, "basket_hit")).await.unwrap();

    assert_eq!(mgr.results(&creds).await.unwrap().score, 52);
}

// =========================================================================
// Rotation and expiry
// =========================================================================

#[tokio::test]
async fn test_sessions_survive_secret_rotation() {
    let store = MemoryStore::new();
    let before = SessionManager::new(
        store,
        Signer::new("secret-v1").unwrap(),
        SessionConfig::default(),
    );
    let creds = start(&before).await;

    // Same store, new deployment with the old secret kept for verification.
    let store = before.into_store();
    let after = SessionManager::new(
        store,
        Signer::new("secret-v2").unwrap().with_previous(["secret-v1"]).unwrap(),
        SessionConfig::default(),
    );

    assert!(after.verify(&creds).await.is_ok());
    let fresh = start(&after).await;
    assert_eq!(
        fresh.client_signature,
        Some(after.signer().sign(fresh.session_token.as_deref().unwrap()))
    );
}

#[tokio::test]
async fn test_sessions_rejected_after_secret_dropped() {
    let before = SessionManager::new(
        MemoryStore::new(),
        Signer::new("secret-v1").unwrap(),
        SessionConfig::default(),
    );
    let creds = start(&before).await;

    let after = SessionManager::new(
        before.into_store(),
        Signer::new("secret-v2").unwrap(),
        SessionConfig::default(),
    );

    assert!(matches!(
        after.verify(&creds).await,
        Err(SessionError::InvalidSession)
    ));
}

#[tokio::test]
async fn test_expire_stale_with_zero_ttl_removes_sessions() {
    let mgr = SessionManager::new(
        MemoryStore::new(),
        Signer::new("s").unwrap(),
        SessionConfig {
            session_ttl_secs: Some(0),
            ..SessionConfig::default()
        },
    );
    let creds = start(&mgr).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let expired = mgr.expire_stale().await.unwrap();

    assert_eq!(expired.len(), 1);
    assert_eq!(Some(&expired[0]), creds.session_token.as_ref());
    assert!(mgr.store().get(&expired[0]).await.is_err());
    assert!(mgr.verify(&creds).await.is_err());
}
