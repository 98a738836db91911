//! HTTP handlers: decode the body, call the session manager, encode the
//! result.
//!
//! Each endpoint is a thin adapter:
//!   1. Decode the raw body leniently (junk becomes an empty request).
//!   2. Call the matching [`SessionManager`](paperthrow_session::SessionManager)
//!      operation.
//!   3. Wrap the result in its wire shape, or let [`ApiError`] render the
//!      failure envelope.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::Method;
use paperthrow_protocol::{
    Ack, Codec, EventRequest, HandshakeRequest, HandshakeResponse,
    ResultsResponse, SessionRequest, Wind,
};
use paperthrow_session::SessionStore;

use crate::ApiError;
use crate::server::ServerState;

type AppState<S, C> = State<Arc<ServerState<S, C>>>;

/// `POST /handshake`
pub(crate) async fn handshake<S, C>(
    State(state): AppState<S, C>,
    body: Bytes,
) -> Result<Json<HandshakeResponse>, ApiError>
where
    S: SessionStore,
    C: Codec,
{
    let req: HandshakeRequest = state.codec.decode_or_default(&body);
    let ack = state.sessions.handshake(req).await?;
    Ok(Json(ack))
}

/// `POST /sendEvent`
pub(crate) async fn send_event<S, C>(
    State(state): AppState<S, C>,
    body: Bytes,
) -> Result<Json<Ack>, ApiError>
where
    S: SessionStore,
    C: Codec,
{
    let req: EventRequest = state.codec.decode_or_default(&body);
    // A duplicate eventId is acknowledged exactly like a fresh event.
    state.sessions.record_event(req).await?;
    Ok(Json(Ack::ok()))
}

/// `POST /getResults`
pub(crate) async fn get_results<S, C>(
    State(state): AppState<S, C>,
    body: Bytes,
) -> Result<Json<ResultsResponse>, ApiError>
where
    S: SessionStore,
    C: Codec,
{
    let req: SessionRequest = state.codec.decode_or_default(&body);
    let results = state.sessions.results(&req).await?;
    Ok(Json(results))
}

/// `POST /getWind`
///
/// The wind is returned bare, without the `ok` field the other endpoints
/// carry. Game clients parse it that way.
pub(crate) async fn get_wind<S, C>(
    State(state): AppState<S, C>,
    body: Bytes,
) -> Result<Json<Wind>, ApiError>
where
    S: SessionStore,
    C: Codec,
{
    let req: SessionRequest = state.codec.decode_or_default(&body);
    let wind = state.sessions.wind(&req).await?;
    Ok(Json(wind))
}

/// Any method other than `POST` on a known path.
pub(crate) async fn post_required(method: Method) -> ApiError {
    tracing::debug!(%method, "rejected non-POST request");
    ApiError::MethodNotAllowed
}

/// Any unknown path.
pub(crate) async fn not_found() -> ApiError {
    ApiError::NotFound
}
