//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create the Axum Router with the three routes and a 404 fallback
//! - Wire up middleware (request id, tracing, timeout, body limit, panic catching)
//! - Own the bound listener and serve until shutdown
//!
//! # Lifecycle
//! ```text
//! HttpServer::new(config) → .bind() → BoundServer → .serve(shutdown) → returns after drain
//! ```

use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::handlers;
use crate::http::request::{make_span, RequestIdGenerator};
use crate::http::response::{describe_timeout, panic_response};
use crate::lifecycle::shutdown;
use crate::pipeline::{MultipartFormParser, Pipeline};

/// Application state injected into handlers. Read-only after construction.
#[derive(Clone, Debug)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub form_parser: MultipartFormParser,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            pipeline: Pipeline::from_config(config),
            form_parser: MultipartFormParser::default(),
        }
    }
}

/// Errors from binding or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// HTTP server for the image filter service.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let state = AppState::from_config(&config);
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::index).fallback(handlers::not_found))
            .route("/upload", post(handlers::upload).fallback(handlers::not_found))
            .route("/filter", post(handlers::filter).fallback(handlers::not_found))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(config.timeouts.request()))
            .layer(middleware::map_response(describe_timeout))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(RequestIdGenerator::default()))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let address = self.config.listener.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(BoundServer {
            listener,
            local_addr,
            router: self.router,
        })
    }
}

/// A server that owns its bound listener and is ready to accept connections.
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
}

impl BoundServer {
    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `shutdown` fires, then finish in-flight
    /// requests and return.
    pub async fn serve(self, shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        tracing::info!(address = %self.local_addr, "HTTP server starting");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
