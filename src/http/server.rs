//! HTTP API server
//!
//! Axum-based HTTP server for the phishscan REST API.

use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{http::Method, Router};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;

use super::auth::AuthState;
use super::handlers::AppState;
use super::routes::create_router;

/// HTTP API server
pub struct HttpServer {
    config: ServerConfig,
    app_state: AppState,
    auth_state: AuthState,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: ServerConfig, app_state: AppState, auth_state: AuthState) -> Self {
        Self {
            config,
            app_state,
            auth_state,
        }
    }

    /// Build the full application: routes, CORS and request tracing
    pub fn app(&self) -> Router {
        let mut app = create_router(self.app_state.clone(), self.auth_state.clone());

        if self.config.cors_enabled {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .allow_origin(Any);
            app = app.layer(cors);
        }

        app.layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run(&self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .context("Invalid HTTP listen address")?;

        let listener = TcpListener::bind(&addr)
            .await
            .context("Failed to bind HTTP server")?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let app = self.app();

        info!("HTTP API server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("HTTP server shutting down");
            })
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}
