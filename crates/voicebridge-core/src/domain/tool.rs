use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in the tool directory `SessionCoordinator` publishes to the
/// model at session start, so it knows what it may ask `ToolRunner` to do
/// and with what shape of input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// A tool invocation requested by the model mid-turn.
///
/// `input` is kept as an untyped `serde_json::Value` because the shape is
/// defined by whatever tool the model named; `ToolRunner` is responsible
/// for validating it against that tool's expectations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Correlates this request with the `ToolResult` sent back to the model.
    #[serde(rename = "toolUseId")]
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// Outcome of running a tool, in the shape `ModelDriver` serializes back
/// onto the model stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    #[serde(rename = "toolUseId")]
    pub tool_use_id: String,
    pub status: ToolStatus,
    /// Already-rendered text content. On `Error`, this is a message safe to
    /// surface to the model, never a raw internal error string.
    pub content: String,
}

impl ToolResult {
    #[must_use]
    pub fn success(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            status: ToolStatus::Success,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn error(tool_use_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            status: ToolStatus::Error,
            content: message.into(),
        }
    }
}
