//! Layered `BridgeConfig` loading: defaults, then an optional TOML file,
//! then individual environment variables, each layer only overriding
//! fields the previous one actually set.

use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Deserialize;

use voicebridge_core::{BridgeConfig, BridgeConfigUpdate, ForwardingMode};

/// Mirrors `BridgeConfig`'s section layout but with every leaf optional,
/// so a TOML file only needs to name the fields it wants to override.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    model: FileModelConfig,
    pacer: FilePacerConfig,
    input: FileInputConfig,
    turn: FileTurnConfig,
    tool: FileToolConfig,
    session: FileSessionConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileModelConfig {
    region: Option<String>,
    model_id: Option<String>,
    system_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilePacerConfig {
    quantum_ms: Option<u32>,
    tick_ms: Option<u32>,
    max_buffer_ms: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileInputConfig {
    forwarding_mode: Option<ForwardingMode>,
    coalesce_max_chunks: Option<u32>,
    coalesce_max_wait_ms: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileTurnConfig {
    silence_timeout_ms: Option<u32>,
    end_gap_ms: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileToolConfig {
    timeout_ms: Option<u32>,
    max_results: Option<u32>,
    min_relevance_score: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSessionConfig {
    ack_timeout_ms: Option<u32>,
    close_deadline_ms: Option<u32>,
}

impl From<FileConfig> for BridgeConfigUpdate {
    fn from(file: FileConfig) -> Self {
        Self {
            model_region: file.model.region.map(Some),
            model_model_id: file.model.model_id.map(Some),
            model_system_prompt: file.model.system_prompt,
            pacer_quantum_ms: file.pacer.quantum_ms,
            pacer_tick_ms: file.pacer.tick_ms,
            pacer_max_buffer_ms: file.pacer.max_buffer_ms,
            input_forwarding_mode: file.input.forwarding_mode,
            input_coalesce_max_chunks: file.input.coalesce_max_chunks,
            input_coalesce_max_wait_ms: file.input.coalesce_max_wait_ms,
            turn_silence_timeout_ms: file.turn.silence_timeout_ms,
            turn_end_gap_ms: file.turn.end_gap_ms,
            tool_timeout_ms: file.tool.timeout_ms,
            tool_max_results: file.tool.max_results,
            tool_min_relevance_score: file.tool.min_relevance_score,
            session_ack_timeout_ms: file.session.ack_timeout_ms,
            session_close_deadline_ms: file.session.close_deadline_ms,
        }
    }
}

/// Read and parse the config file at `path`, if it exists. A missing file
/// is not an error — the caller only passes a path here when one was
/// actually given via `--config`/`VOICEBRIDGE_CONFIG`.
fn load_file(path: &Path) -> Result<BridgeConfigUpdate> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let file: FileConfig =
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))?;
    Ok(file.into())
}

/// Build an update from individual environment variables. These are
/// applied last, after the config file, so they always win.
fn load_env() -> BridgeConfigUpdate {
    BridgeConfigUpdate {
        model_region: env_string("VOICEBRIDGE_MODEL_REGION").map(Some),
        model_model_id: env_string("VOICEBRIDGE_MODEL_ID").map(Some),
        model_system_prompt: env_string("VOICEBRIDGE_SYSTEM_PROMPT"),
        pacer_quantum_ms: env_parsed("VOICEBRIDGE_PACER_QUANTUM_MS"),
        pacer_tick_ms: env_parsed("VOICEBRIDGE_PACER_TICK_MS"),
        pacer_max_buffer_ms: env_parsed("VOICEBRIDGE_PACER_MAX_BUFFER_MS"),
        input_forwarding_mode: env_string("VOICEBRIDGE_FORWARDING_MODE").and_then(|value| {
            match value.as_str() {
                "immediate" => Some(ForwardingMode::Immediate),
                "coalesced" => Some(ForwardingMode::Coalesced),
                _ => None,
            }
        }),
        input_coalesce_max_chunks: env_parsed("VOICEBRIDGE_COALESCE_MAX_CHUNKS"),
        input_coalesce_max_wait_ms: env_parsed("VOICEBRIDGE_COALESCE_MAX_WAIT_MS"),
        turn_silence_timeout_ms: env_parsed("VOICEBRIDGE_SILENCE_TIMEOUT_MS"),
        turn_end_gap_ms: env_parsed("VOICEBRIDGE_TURN_END_GAP_MS"),
        tool_timeout_ms: env_parsed("VOICEBRIDGE_TOOL_TIMEOUT_MS"),
        tool_max_results: env_parsed("VOICEBRIDGE_TOOL_MAX_RESULTS"),
        tool_min_relevance_score: env_parsed("VOICEBRIDGE_TOOL_MIN_RELEVANCE_SCORE"),
        session_ack_timeout_ms: env_parsed("VOICEBRIDGE_SESSION_ACK_TIMEOUT_MS"),
        session_close_deadline_ms: env_parsed("VOICEBRIDGE_SESSION_CLOSE_DEADLINE_MS"),
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|value| value.parse().ok())
}

/// Load `.env` (if present), then assemble `BridgeConfig` from defaults,
/// an optional TOML file, and environment variables, in that order of
/// increasing precedence.
pub fn load(config_path: Option<&Path>) -> Result<BridgeConfig> {
    dotenvy::dotenv().ok();

    let mut config = BridgeConfig::with_defaults();

    let resolved_path = config_path
        .map(std::path::PathBuf::from)
        .or_else(|| std::env::var("VOICEBRIDGE_CONFIG").ok().map(std::path::PathBuf::from));
    if let Some(path) = resolved_path {
        let update = load_file(&path)?;
        config.merge(&update);
    }

    config.merge(&load_env());

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_config_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[model]\nregion = \"us-east-1\"\nmodel_id = \"speech-1\"\n\n[turn]\nsilence_timeout_ms = 4000\n"
        )
        .unwrap();

        let update = load_file(file.path()).unwrap();
        let mut config = BridgeConfig::with_defaults();
        config.merge(&update);

        assert_eq!(config.model.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.model.model_id.as_deref(), Some("speech-1"));
        assert_eq!(config.turn.silence_timeout_ms, 4_000);
        assert_eq!(config.pacer.quantum_ms, 20); // untouched field keeps the default
    }

    #[test]
    fn missing_fields_in_the_file_leave_the_default_untouched() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model]\nregion = \"us-east-1\"\n").unwrap();

        let update = load_file(file.path()).unwrap();
        let mut config = BridgeConfig::with_defaults();
        config.merge(&update);

        assert_eq!(config.model.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.model.model_id, None);
    }
}
