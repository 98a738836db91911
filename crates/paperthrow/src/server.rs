//! `PaperthrowServer` builder and serve loop.
//!
//! Ties the layers together: HTTP (axum) → protocol (codec) → session
//! (manager + store). Also owns the optional background sweep that drops
//! sessions older than the configured TTL.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{Method, header};
use axum::routing::post;
use paperthrow_protocol::{Codec, JsonCodec};
use paperthrow_session::{SessionConfig, SessionManager, SessionStore, Signer};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::PaperthrowError;
use crate::handler;

/// Shared server state passed to every request handler.
///
/// Wrapped in `Arc` so axum can clone it per request. Nothing in here is
/// mutated in place; all session state lives in the store.
pub(crate) struct ServerState<S: SessionStore, C: Codec> {
    pub(crate) sessions: SessionManager<S>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a PaperThrow server.
///
/// # Example
///
/// ```rust,ignore
/// let server = PaperthrowServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .session_config(SessionConfig { session_ttl_secs: Some(86_400), ..Default::default() })
///     .build(Signer::new(secret)?, MemoryStore::new())
///     .await?;
/// server.run().await
/// ```
pub struct PaperthrowServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl PaperthrowServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener and assembles the server around `store`.
    ///
    /// Uses [`JsonCodec`] for request and response bodies.
    pub async fn build<S: SessionStore>(
        self,
        signer: Signer,
        store: S,
    ) -> Result<PaperthrowServer<S, JsonCodec>, PaperthrowError> {
        let listener = TcpListener::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: SessionManager::new(store, signer, self.session_config),
            codec: JsonCodec,
        });

        Ok(PaperthrowServer { listener, state })
    }
}

impl Default for PaperthrowServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound PaperThrow server.
///
/// Call [`run()`](Self::run) to start serving requests.
pub struct PaperthrowServer<S: SessionStore, C: Codec> {
    listener: TcpListener,
    state: Arc<ServerState<S, C>>,
}

impl<S, C> PaperthrowServer<S, C>
where
    S: SessionStore,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// The session manager behind the endpoints.
    pub fn sessions(&self) -> &SessionManager<S> {
        &self.state.sessions
    }

    /// Serves requests until the process is terminated.
    pub async fn run(self) -> Result<(), PaperthrowError> {
        self.run_until(std::future::pending()).await
    }

    /// Serves requests until `shutdown` resolves, then drains in-flight
    /// requests and returns.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), PaperthrowError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.listener.local_addr()?;
        let sweeper = spawn_sweeper(Arc::clone(&self.state));
        let app = router(Arc::clone(&self.state));

        tracing::info!(%addr, "PaperThrow server running");

        let result = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        tracing::info!("PaperThrow server stopped");
        Ok(result?)
    }
}

/// Builds the router: four POST routes, CORS open to every origin, and
/// the uniform error envelope for wrong methods and unknown paths.
pub(crate) fn router<S, C>(state: Arc<ServerState<S, C>>) -> Router
where
    S: SessionStore,
    C: Codec,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            "/handshake",
            post(handler::handshake::<S, C>).fallback(handler::post_required),
        )
        .route(
            "/sendEvent",
            post(handler::send_event::<S, C>).fallback(handler::post_required),
        )
        .route(
            "/getResults",
            post(handler::get_results::<S, C>).fallback(handler::post_required),
        )
        .route(
            "/getWind",
            post(handler::get_wind::<S, C>).fallback(handler::post_required),
        )
        .fallback(handler::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Starts the TTL sweep, if a TTL is configured.
fn spawn_sweeper<S, C>(state: Arc<ServerState<S, C>>) -> Option<JoinHandle<()>>
where
    S: SessionStore,
    C: Codec,
{
    let config = state.sessions.config();
    let ttl_secs = config.session_ttl_secs?;
    let every = Duration::from_secs(config.sweep_interval_secs.max(1));

    tracing::info!(ttl_secs, sweep_secs = every.as_secs(), "session expiry enabled");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick fires immediately; nothing can be stale yet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = state.sessions.expire_stale().await {
                tracing::error!(error = %e, "session sweep failed");
            }
        }
    }))
}
