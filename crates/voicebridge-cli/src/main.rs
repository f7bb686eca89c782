//! CLI entry point — the composition root.
//!
//! Parses arguments, initializes structured logging from `RUST_LOG`, and
//! dispatches to the command handler. All infrastructure wiring happens
//! in [`voicebridge_cli::context::bootstrap`]; nothing here touches a
//! concrete adapter directly.

use clap::Parser;

use voicebridge_cli::{Cli, Commands, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            config,
            knowledge_base_url,
        } => handlers::serve::execute(host, port, config, knowledge_base_url).await,
    }
}
