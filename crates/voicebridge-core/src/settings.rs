//! Bridge configuration domain types and validation.
//!
//! This module contains the pure configuration types used across the
//! bridge. These are plain domain types with no infrastructure dependencies
//! (no clap, no file I/O) - the CLI crate is responsible for loading these
//! from environment/file/flags and handing over a validated `BridgeConfig`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PACER_QUANTUM_MS: u32 = 20;
pub const DEFAULT_PACER_TICK_MS: u32 = 5;
pub const DEFAULT_PACER_MAX_BUFFER_MS: u32 = 3_000;
pub const DEFAULT_COALESCE_MAX_CHUNKS: u32 = 5;
pub const DEFAULT_COALESCE_MAX_WAIT_MS: u32 = 100;
pub const DEFAULT_SILENCE_TIMEOUT_MS: u32 = 3_000;
pub const DEFAULT_TURN_END_GAP_MS: u32 = 100;
pub const DEFAULT_TOOL_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_TOOL_MAX_RESULTS: u32 = 3;
pub const DEFAULT_TOOL_MIN_RELEVANCE_SCORE: f32 = 0.5;
pub const DEFAULT_SESSION_ACK_TIMEOUT_MS: u32 = 2_000;
pub const DEFAULT_SESSION_CLOSE_DEADLINE_MS: u32 = 10_000;

/// How `InputFlow` forwards telephony audio to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardingMode {
    /// Forward every inbound chunk to the model as soon as it is resampled.
    Immediate,
    /// Batch up to `coalesce_max_chunks` chunks (or `coalesce_max_wait_ms`,
    /// whichever comes first) into one `AudioInput` event.
    Coalesced,
}

/// Model endpoint selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    pub region: Option<String>,
    pub model_id: Option<String>,
    /// Sent as the first content block (`role: System, kind: Text`) of
    /// every prompt (see `InputFlow::open_turn`).
    pub system_prompt: String,
}

/// `OutputPacer` timing and buffering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PacerConfig {
    pub quantum_ms: u32,
    pub tick_ms: u32,
    pub max_buffer_ms: u32,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            quantum_ms: DEFAULT_PACER_QUANTUM_MS,
            tick_ms: DEFAULT_PACER_TICK_MS,
            max_buffer_ms: DEFAULT_PACER_MAX_BUFFER_MS,
        }
    }
}

/// `InputFlow` batching.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InputConfig {
    pub forwarding_mode: ForwardingMode,
    pub coalesce_max_chunks: u32,
    pub coalesce_max_wait_ms: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            forwarding_mode: ForwardingMode::Immediate,
            coalesce_max_chunks: DEFAULT_COALESCE_MAX_CHUNKS,
            coalesce_max_wait_ms: DEFAULT_COALESCE_MAX_WAIT_MS,
        }
    }
}

/// Turn-manager silence detection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TurnConfig {
    pub silence_timeout_ms: u32,
    pub end_gap_ms: u32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            silence_timeout_ms: DEFAULT_SILENCE_TIMEOUT_MS,
            end_gap_ms: DEFAULT_TURN_END_GAP_MS,
        }
    }
}

/// `ToolRunner` timeout and result shaping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub timeout_ms: u32,
    pub max_results: u32,
    pub min_relevance_score: f32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TOOL_TIMEOUT_MS,
            max_results: DEFAULT_TOOL_MAX_RESULTS,
            min_relevance_score: DEFAULT_TOOL_MIN_RELEVANCE_SCORE,
        }
    }
}

/// `SessionCoordinator` lifecycle deadlines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub ack_timeout_ms: u32,
    pub close_deadline_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: DEFAULT_SESSION_ACK_TIMEOUT_MS,
            close_deadline_ms: DEFAULT_SESSION_CLOSE_DEADLINE_MS,
        }
    }
}

/// Full bridge configuration, assembled from defaults plus whatever the
/// composition root loads from environment/file/flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub model: ModelConfig,
    pub pacer: PacerConfig,
    pub input: InputConfig,
    pub turn: TurnConfig,
    pub tool: ToolConfig,
    pub session: SessionConfig,
}

impl BridgeConfig {
    /// Configuration with every timing/sizing field at its documented
    /// default. `model.region`/`model.model_id` are left unset since they
    /// have no sensible default.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Merge another configuration into this one, only overwriting fields
    /// that are present in `other`.
    pub fn merge(&mut self, other: &BridgeConfigUpdate) {
        if let Some(ref region) = other.model_region {
            self.model.region.clone_from(region);
        }
        if let Some(ref model_id) = other.model_model_id {
            self.model.model_id.clone_from(model_id);
        }
        if let Some(ref system_prompt) = other.model_system_prompt {
            self.model.system_prompt.clone_from(system_prompt);
        }
        if let Some(quantum) = other.pacer_quantum_ms {
            self.pacer.quantum_ms = quantum;
        }
        if let Some(tick) = other.pacer_tick_ms {
            self.pacer.tick_ms = tick;
        }
        if let Some(max_buffer) = other.pacer_max_buffer_ms {
            self.pacer.max_buffer_ms = max_buffer;
        }
        if let Some(mode) = other.input_forwarding_mode {
            self.input.forwarding_mode = mode;
        }
        if let Some(chunks) = other.input_coalesce_max_chunks {
            self.input.coalesce_max_chunks = chunks;
        }
        if let Some(wait) = other.input_coalesce_max_wait_ms {
            self.input.coalesce_max_wait_ms = wait;
        }
        if let Some(silence) = other.turn_silence_timeout_ms {
            self.turn.silence_timeout_ms = silence;
        }
        if let Some(gap) = other.turn_end_gap_ms {
            self.turn.end_gap_ms = gap;
        }
        if let Some(timeout) = other.tool_timeout_ms {
            self.tool.timeout_ms = timeout;
        }
        if let Some(max_results) = other.tool_max_results {
            self.tool.max_results = max_results;
        }
        if let Some(score) = other.tool_min_relevance_score {
            self.tool.min_relevance_score = score;
        }
        if let Some(ack) = other.session_ack_timeout_ms {
            self.session.ack_timeout_ms = ack;
        }
        if let Some(close) = other.session_close_deadline_ms {
            self.session.close_deadline_ms = close;
        }
    }
}

/// Partial configuration update: every field is `Option<T>`, `None` means
/// "leave unchanged". Flattened rather than nested to keep the CLI/env
/// loader that populates it simple.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfigUpdate {
    pub model_region: Option<Option<String>>,
    pub model_model_id: Option<Option<String>>,
    pub model_system_prompt: Option<String>,
    pub pacer_quantum_ms: Option<u32>,
    pub pacer_tick_ms: Option<u32>,
    pub pacer_max_buffer_ms: Option<u32>,
    pub input_forwarding_mode: Option<ForwardingMode>,
    pub input_coalesce_max_chunks: Option<u32>,
    pub input_coalesce_max_wait_ms: Option<u32>,
    pub turn_silence_timeout_ms: Option<u32>,
    pub turn_end_gap_ms: Option<u32>,
    pub tool_timeout_ms: Option<u32>,
    pub tool_max_results: Option<u32>,
    pub tool_min_relevance_score: Option<f32>,
    pub session_ack_timeout_ms: Option<u32>,
    pub session_close_deadline_ms: Option<u32>,
}

/// Configuration validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("model.region must be set")]
    MissingRegion,

    #[error("model.modelId must be set")]
    MissingModelId,

    #[error("pacer.tickMs ({tick}) must not exceed pacer.quantumMs ({quantum})")]
    TickExceedsQuantum { tick: u32, quantum: u32 },

    #[error("tool.minRelevanceScore must be between 0.0 and 1.0, got {0}")]
    InvalidRelevanceScore(f32),

    #[error("tool.maxResults must be at least 1, got {0}")]
    InvalidMaxResults(u32),
}

/// Validate a fully assembled configuration before it is used to start the
/// bridge.
pub fn validate_config(config: &BridgeConfig) -> Result<(), ConfigError> {
    if config.model.region.as_deref().is_none_or(str::is_empty) {
        return Err(ConfigError::MissingRegion);
    }
    if config.model.model_id.as_deref().is_none_or(str::is_empty) {
        return Err(ConfigError::MissingModelId);
    }
    if config.pacer.tick_ms > config.pacer.quantum_ms {
        return Err(ConfigError::TickExceedsQuantum {
            tick: config.pacer.tick_ms,
            quantum: config.pacer.quantum_ms,
        });
    }
    if !(0.0..=1.0).contains(&config.tool.min_relevance_score) {
        return Err(ConfigError::InvalidRelevanceScore(
            config.tool.min_relevance_score,
        ));
    }
    if config.tool.max_results < 1 {
        return Err(ConfigError::InvalidMaxResults(config.tool.max_results));
    }
    Ok(())
}
