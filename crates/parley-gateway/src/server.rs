// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. Binding and serving are
//! split so tests can bind port 0 and read back the local address.

use std::sync::Arc;

use axum::{Router, routing::get};
use dashmap::DashMap;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use parley_core::{MessageStore, ParleyError};

use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The message store, injected so tests can substitute a fake.
    pub store: Arc<dyn MessageStore>,
    /// Map of connection id -> mpsc sender feeding that connection's socket.
    pub clients: Arc<DashMap<String, mpsc::Sender<String>>>,
    /// Display name for connections that supply none.
    pub default_username: String,
    /// Process start time for the health probe's uptime field.
    pub started_at: std::time::Instant,
}

impl GatewayState {
    /// Create gateway state around an injected store.
    pub fn new(store: Arc<dyn MessageStore>, default_username: String) -> Self {
        Self {
            store,
            clients: Arc::new(DashMap::new()),
            default_username,
            started_at: std::time::Instant::now(),
        }
    }
}

/// Gateway server configuration (mirrors `[server]` from parley-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind. Port 0 binds an ephemeral port (tests).
    pub port: u16,
}

/// Assemble the gateway router.
///
/// Routes:
/// - `GET /` (static chat page)
/// - `GET /health` (probe)
/// - `GET /ws` (WebSocket upgrade; handshake via query params)
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::get_health))
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the gateway listener.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ParleyError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr)
        .await
        .map_err(|e| ParleyError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Serve the gateway until the cancellation token fires.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), ParleyError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "gateway listening");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| ParleyError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })
}
