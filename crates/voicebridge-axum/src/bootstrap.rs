//! Server bootstrap — binds the listener and serves the router built from
//! an already-assembled [`AppState`].
//!
//! Unlike this workspace's other adapters, this crate does not itself
//! construct the `BridgeContext` (that composition belongs to the binary
//! that owns configuration loading); it only turns one into a running
//! HTTP server.

use anyhow::Result;
use tokio::net::TcpListener;

use crate::routes::{CorsConfig, create_router};
use crate::state::AppState;

/// Network-level configuration for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

impl ServerConfig {
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors: CorsConfig::default(),
        }
    }
}

/// Bind `config.host:config.port` and serve `state` until the process is
/// signalled to stop. Runs forever on success; returns on a bind/accept
/// error.
pub async fn start_server(config: ServerConfig, state: AppState) -> Result<()> {
    let app = create_router(state, &config.cors);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "voicebridge server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
