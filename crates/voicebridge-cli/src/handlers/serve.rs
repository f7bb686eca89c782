//! `serve` command handler.

use std::path::PathBuf;

use anyhow::Result;

use voicebridge_axum::{CorsConfig, ServerConfig, start_server};

use crate::context::bootstrap;

/// Bring the bridge up: bootstrap the composition root, then bind and
/// serve until the process is killed or the listener fails.
pub async fn execute(
    host: String,
    port: u16,
    config_path: Option<PathBuf>,
    knowledge_base_url: Option<String>,
) -> Result<()> {
    let bootstrapped = bootstrap(config_path.as_deref(), knowledge_base_url)?;

    tracing::info!(
        region = bootstrapped.config.model.region.as_deref().unwrap_or("?"),
        model_id = bootstrapped.config.model.model_id.as_deref().unwrap_or("?"),
        "bridge configuration resolved"
    );

    let server_config = ServerConfig {
        host,
        port,
        cors: CorsConfig::default(),
    };

    start_server(server_config, bootstrapped.context).await
}

#[cfg(test)]
mod tests {
    #[test]
    fn serve_handler_exists() {
        // Exercising this end to end requires a bound socket and a live
        // model endpoint; covered by the adapter crates' own tests.
    }
}
