//! Request and response bodies for the four PaperThrow endpoints.
//!
//! Field names on the wire are camelCase (`sessionToken`, `deviceId`)
//! because the game client was written against that shape. Every request
//! field is optional: presence is checked by the session layer, not by
//! deserialization, so a missing field turns into a proper
//! `Missing params` / `Invalid session` response instead of a decode error.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /handshake`.
///
/// The three values are opaque client metadata. They are stored as-is
/// (string, number, whatever the client sent) and never validated beyond
/// being present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeRequest {
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(default)]
    pub checksum: Option<Value>,
    #[serde(default)]
    pub device_id: Option<Value>,
}

/// Credentials carried by every authenticated request.
///
/// Used directly as the body of `/getResults` and `/getWind`, and
/// flattened into [`EventRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub client_signature: Option<String>,
}

/// Body of `POST /sendEvent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    #[serde(flatten)]
    pub credentials: SessionRequest,

    /// `throw`, `basket_hit`, `score_update`, or anything else the client
    /// wants recorded. A number or boolean is kept in its JSON text form.
    #[serde(default, deserialize_with = "scalar_string")]
    pub event_type: Option<String>,

    /// Client-side timestamp. Any JSON value; the server substitutes its
    /// own clock when this is absent or falsy.
    #[serde(default)]
    pub timestamp: Option<Value>,

    /// Opaque payload. For `score_update` this is usually a JSON-encoded
    /// string such as `"{\"totalScore\":42}"`.
    #[serde(default)]
    pub data: Option<Value>,

    /// Optional client-generated idempotency key. A repeated id within the
    /// same session is acknowledged but not applied a second time.
    /// Numeric ids are accepted: `7` and `"7"` are the same id.
    #[serde(default, deserialize_with = "scalar_string")]
    pub event_id: Option<String>,
}

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// The event types that move a session's aggregates.
///
/// Anything unrecognised lands in `Other` and is stored without touching
/// the counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// The player threw; `throws += 1`.
    Throw,
    /// The throw landed; `hits += 1`, `score += 10`.
    BasketHit,
    /// The client reports its own running total.
    ScoreUpdate,
    /// Recorded only.
    Other(String),
}

impl EventKind {
    /// Classifies the raw `eventType` string from the wire.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "throw" => Self::Throw,
            "basket_hit" => Self::BasketHit,
            "score_update" => Self::ScoreUpdate,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Throw => "throw",
            Self::BasketHit => "basket_hit",
            Self::ScoreUpdate => "score_update",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// `{ "ok": true }`, the bare success acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// `{ "ok": false, "error": "..." }`, the failure envelope shared by every
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}

/// Success body of `/handshake`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeResponse {
    pub ok: bool,
    pub session_token: String,
    pub signature: String,
}

/// Success body of `/getResults`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub ok: bool,
    pub score: u64,
    pub hits: u64,
    /// Number of throws. Named `shots` on the wire.
    pub shots: u64,
    /// `hits / shots`, or `0` when nothing has been thrown yet.
    pub accuracy: f64,
    /// Always `0`. Kept because shipped clients read it.
    pub time_taken: u64,
}

/// A per-session wind vector.
///
/// Returned unwrapped by `/getWind` (no `ok` envelope) and cached on the
/// session as `lastWind`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub strength: f64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns `true` for values a JavaScript client would consider "set".
///
/// `null`, `false`, `0` and `""` count as missing; everything else,
/// including empty arrays and objects, counts as present.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Reads any JSON scalar as a string; arrays, objects and `null` become
/// `None`.
///
/// A mistyped optional field must not fail the whole body, or the
/// credentials decoded alongside it would be lost with it.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}
