//! Canonical event union emitted by bridge components for observability.
//!
//! These events are not part of the wire protocol to either the telephony
//! peer or the speech model; they exist purely so adapters can log,
//! export metrics, or drive a dashboard without every component taking a
//! direct dependency on `tracing` macros sprinkled through business logic.

use serde::Serialize;

use crate::domain::CallId;

/// Lifecycle and health events raised by `SessionCoordinator`, `InputFlow`,
/// `OutputPacer`, and `ToolRunner`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// A telephony call was registered and its session is being bootstrapped.
    SessionStarted { call_id: CallId },

    /// A session ended, cleanly or otherwise.
    SessionEnded { call_id: CallId, reason: String },

    /// A conversational turn began.
    TurnStarted { call_id: CallId },

    /// A conversational turn ended.
    TurnEnded { call_id: CallId },

    /// A tool call was dispatched to `ToolRunner`.
    ToolInvoked { call_id: CallId, tool_name: String },

    /// A tool call failed; the session continues, the model receives an
    /// error `ToolResult`.
    ToolFailed {
        call_id: CallId,
        tool_name: String,
        error: String,
    },

    /// `OutputPacer`'s buffer exceeded its capacity and dropped frames.
    OutputBufferOverflow { call_id: CallId, dropped_frames: u32 },

    /// The model stream reported an error for this session.
    ModelStreamError { call_id: CallId, detail: String },
}

impl BridgeEvent {
    #[must_use]
    pub const fn call_id(&self) -> &CallId {
        match self {
            Self::SessionStarted { call_id }
            | Self::SessionEnded { call_id, .. }
            | Self::TurnStarted { call_id }
            | Self::TurnEnded { call_id }
            | Self::ToolInvoked { call_id, .. }
            | Self::ToolFailed { call_id, .. }
            | Self::OutputBufferOverflow { call_id, .. }
            | Self::ModelStreamError { call_id, .. } => call_id,
        }
    }

    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session:started",
            Self::SessionEnded { .. } => "session:ended",
            Self::TurnStarted { .. } => "turn:started",
            Self::TurnEnded { .. } => "turn:ended",
            Self::ToolInvoked { .. } => "tool:invoked",
            Self::ToolFailed { .. } => "tool:failed",
            Self::OutputBufferOverflow { .. } => "pacer:buffer_overflow",
            Self::ModelStreamError { .. } => "model:stream_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_stable() {
        let call_id = CallId::new("CA1");
        assert_eq!(
            BridgeEvent::SessionStarted {
                call_id: call_id.clone()
            }
            .event_name(),
            "session:started"
        );
        assert_eq!(
            BridgeEvent::ToolInvoked {
                call_id,
                tool_name: "lookup_docs".into()
            }
            .event_name(),
            "tool:invoked"
        );
    }
}
