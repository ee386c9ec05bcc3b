//! # HTTP API
//!
//! axum server exposing the share endpoint and the browser page.
//!
//! Endpoints:
//! - POST /api/share - create / update / get / heartbeat
//! - GET /api/status - store statistics
//! - GET /health - liveness probe
//! - GET /share - collaborative editor page
//! - GET / - redirect to /share
//!
//! All session state lives in one [`SessionStore`] behind a mutex. Every
//! share action refreshes the session's access time, so there is no
//! read-only path worth a reader/writer split.

mod error;
mod handlers;
mod rate_limit;

pub use error::ApiError;
pub use handlers::{HealthResponse, StatusResponse};

use crate::config::{ConfigError, ServerConfig};
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header};
use axum::routing::{get, post};
use axum::{Router, middleware};
use codeshare_core::SessionStore;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// =============================================================================
// STATE
// =============================================================================

/// State shared by every handler.
pub struct AppState {
    pub(crate) store: Mutex<SessionStore>,
    pub(crate) limiter: Option<DefaultDirectRateLimiter>,
    pub(crate) ttl_secs: u64,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_store(SessionStore::new(config.store_config()), config)
    }

    /// Use a pre-built store (seeded stores in tests).
    pub fn with_store(store: SessionStore, config: &ServerConfig) -> Self {
        let limiter = config
            .rate_limit()
            .map(|(rate, burst)| RateLimiter::direct(Quota::per_second(rate).allow_burst(burst)));

        Self {
            store: Mutex::new(store),
            limiter,
            ttl_secs: config.ttl_secs,
        }
    }

    /// Drop expired sessions now. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        self.store.lock().await.sweep_expired(now_millis())
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router.
pub fn router(state: SharedState, config: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/api/share", post(handlers::share))
        .route("/api/status", get(handlers::status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_requests,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handlers::index))
        .route("/share", get(handlers::page))
        .route("/health", get(handlers::health))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(config.body_limit())),
        )
        .with_state(state)
}

// =============================================================================
// SERVER LIFECYCLE
// =============================================================================

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the server until Ctrl-C or SIGTERM.
pub async fn serve(config: ServerConfig) -> Result<(), ServeError> {
    config.validate()?;
    let addr = config.socket_addr()?;

    let state: SharedState = Arc::new(AppState::new(&config));
    let sweeper = spawn_sweeper(state.clone(), config.sweep_interval());
    let app = router(state, &config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tracing::info!("CodeShare listening on http://{}", local);
    tracing::info!(
        ttl_secs = config.ttl_secs,
        max_sessions = config.max_sessions,
        max_content_bytes = config.max_content_bytes,
        "share page at http://{}/share",
        local
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.abort();
    served?;
    tracing::info!("CodeShare stopped");
    Ok(())
}

/// Periodically drop expired sessions.
pub fn spawn_sweeper(state: SharedState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = state.sweep().await;
            if removed > 0 {
                tracing::info!(removed, "expired idle sessions");
            } else {
                tracing::trace!("sweep found nothing to expire");
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
