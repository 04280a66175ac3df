//! Janus server library.
//!
//! Provides a reusable serve function usable from the binary or from
//! integration tests, plus the axum router wiring the translation proxy.

#![deny(missing_docs)]

mod audit;
mod auth;
mod error;
mod handlers;
mod http_client;
mod state;
mod streaming;

use std::{net::SocketAddr, sync::Arc};

use anyhow::anyhow;
use axum::{
    Router,
    routing::{get, post},
};
use config::Config;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use error::ProxyError;
pub use state::ProxyState;

/// Configuration for serving janus.
pub struct ServeConfig {
    /// The socket address (IP and port) the server will bind to.
    pub listen_address: SocketAddr,
    /// The deserialized janus TOML configuration.
    pub config: Config,
    /// Cancellation token for graceful shutdown.
    pub shutdown_signal: CancellationToken,
    /// Optional oneshot sender to send back the bound address (useful if
    /// port 0 was specified).
    pub bound_addr_sender: Option<tokio::sync::oneshot::Sender<SocketAddr>>,
}

/// Build the proxy router on top of the given state.
pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/v1/messages", post(handlers::messages))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Starts and runs the janus server with the provided configuration.
pub async fn serve(
    ServeConfig {
        listen_address,
        config,
        shutdown_signal,
        bound_addr_sender,
    }: ServeConfig,
) -> anyhow::Result<()> {
    let state = Arc::new(ProxyState::new(config));
    let app = router(state);

    let listener = TcpListener::bind(listen_address)
        .await
        .map_err(|e| anyhow!("Failed to bind to {listen_address}: {e}"))?;

    if let Some(sender) = bound_addr_sender {
        sender
            .send(listener.local_addr()?)
            .map_err(|_| anyhow!("Failed to send back bound address."))?;
    }

    log::info!("Messages endpoint: http://{listen_address}/v1/messages");

    tokio::select! {
        result = axum::serve(listener, app) => {
            result.map_err(|e| anyhow!("Failed to start HTTP server: {e}"))?;
        }
        _ = shutdown_signal.cancelled() => {
            log::info!("Received shutdown signal, shutting down gracefully...");
        }
    }

    Ok(())
}
