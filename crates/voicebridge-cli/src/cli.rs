//! Top-level argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "voicebridge")]
#[command(about = "Real-time telephony-to-speech-model voice bridge")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the bridge server.
    Serve {
        /// Interface to bind the HTTP/WebSocket server on.
        #[arg(long, env = "VOICEBRIDGE_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to bind the HTTP/WebSocket server on.
        #[arg(long, env = "VOICEBRIDGE_PORT", default_value_t = 8080)]
        port: u16,

        /// Path to an optional TOML configuration file.
        #[arg(long, env = "VOICEBRIDGE_CONFIG")]
        config: Option<PathBuf>,

        /// Base URL of the knowledge-retrieval HTTP service.
        #[arg(long, env = "VOICEBRIDGE_KNOWLEDGE_BASE_URL")]
        knowledge_base_url: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_parses_host_and_port() {
        let cli = Cli::parse_from(["voicebridge", "serve", "--host", "127.0.0.1", "--port", "9000"]);
        let Commands::Serve { host, port, .. } = cli.command;
        assert_eq!(host, "127.0.0.1");
        assert_eq!(port, 9000);
    }
}
