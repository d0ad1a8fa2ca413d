//! Web layer module
//!
//! This module provides the HTTP interface for the fingerprint service.
//! Handlers are thin and delegate to [`FingerprintService`] for the actual
//! work.
//!
//! # Architecture
//!
//! - **Handlers**: `/hash` and `/health`
//! - **Responses**: JSON bodies and error-category to status mapping
//! - **Middleware**: request logging, CORS, panic safety net

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::get,
};
use std::net::SocketAddr;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};
use tracing::{info, warn};

use crate::{config::Config, services::FingerprintService};

pub mod handlers;
pub mod middleware;
pub mod responses;

pub use responses::{ErrorResponse, HealthResponse};

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub fingerprint_service: FingerprintService,
    /// Application start time for uptime calculation
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: Config, fingerprint_service: FingerprintService) -> Self {
        Self {
            config,
            fingerprint_service,
            start_time: chrono::Utc::now(),
        }
    }
}

impl WebServer {
    pub fn new(config: Config, fingerprint_service: FingerprintService) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        let app = Self::create_router(AppState::new(config, fingerprint_service));
        Ok(Self { app, addr })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        let body_limit = state.config.web.max_upload_bytes;

        Router::new()
            .route("/health", get(handlers::health::health_check))
            .route(
                "/hash",
                get(handlers::hash::compute_hash).post(handlers::hash::compute_hash),
            )
            // Middleware (applied in reverse order)
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(CorsLayer::permissive())
            .layer(axum::middleware::from_fn(
                middleware::request_logging_middleware,
            ))
            // Outermost: a panicking handler must not take the process down
            .layer(CatchPanicLayer::custom(responses::panic_response))
            .with_state(state)
    }

    /// Start the web server
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, self.app).await?;
        Ok(())
    }

    /// Serve with a notification when the server is actually listening or fails to bind
    pub async fn serve_with_signal(
        self,
        ready_signal: tokio::sync::oneshot::Sender<Result<()>>,
    ) -> Result<()> {
        match tokio::net::TcpListener::bind(&self.addr).await {
            Ok(listener) => {
                // Signal that we're now actually listening on the port
                let _ = ready_signal.send(Ok(()));

                axum::serve(listener, self.app)
                    .with_graceful_shutdown(shutdown_signal())
                    .await?;
                Ok(())
            }
            Err(bind_error) => {
                let bind_err_msg = format!("Failed to bind to {}: {}", self.addr, bind_error);
                let _ = ready_signal.send(Err(anyhow::anyhow!("{}", bind_err_msg)));
                Err(anyhow::anyhow!("{}", bind_err_msg))
            }
        }
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Resolves on SIGTERM / SIGINT (Ctrl+C elsewhere)
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down gracefully");
                    }
                    _ = sigint.recv() => {
                        info!("Received SIGINT (Ctrl+C), shutting down gracefully");
                    }
                }
            }
            _ => {
                warn!("Failed to install signal handlers, graceful shutdown disabled");
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down gracefully"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}
