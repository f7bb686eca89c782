use serde::{Deserialize, Serialize};

use super::audio::AudioFrame;
use super::session::CallId;
use super::tool::{ToolDescriptor, ToolRequest, ToolResult};

/// Why the model ended a turn or a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model reached a natural end of its own output.
    EndTurn,
    /// The telephony side started talking over the model (barge-in).
    Interrupted,
    /// The model is pausing to wait on a tool result.
    ToolUse,
    /// Nothing more is coming; the session itself is over.
    SessionEnd,
}

/// Who a piece of model-bound content is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentRole {
    System,
    User,
    Assistant,
}

/// What kind of payload a content block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Text,
    Audio,
    Tool,
}

/// Events `ModelDriver` writes onto the outbound stream, in the order the
/// outbound grammar permits. Each variant maps to exactly one frame on the
/// wire; `ModelDriver` is the only component allowed to construct these.
#[derive(Debug, Clone)]
pub enum ModelRequestEvent {
    /// Opens the session-level envelope. Must be the first event sent.
    /// Carries the tool directory the coordinator publishes once, up
    /// front; the system prompt travels as the first content block of
    /// every prompt instead (see `ContentStart`).
    SessionStart {
        call_id: CallId,
        tools: Vec<ToolDescriptor>,
    },
    /// Opens a new turn inside an already-open session.
    PromptStart { call_id: CallId },
    /// Opens a content block within the current prompt. The first content
    /// of every prompt must be `role: System, kind: Text`.
    ContentStart {
        call_id: CallId,
        role: ContentRole,
        kind: ContentKind,
    },
    /// A chunk of text payload for the currently open `Text` content block.
    TextInput { call_id: CallId, text: String },
    /// One chunk of telephony audio, already resampled to the model's input
    /// rate, for the currently open `Audio` content block. May repeat any
    /// number of times before the block's `ContentEnd`.
    AudioInput { call_id: CallId, frame: AudioFrame },
    /// The answer to a tool the model previously requested via
    /// `ModelResponseEvent::ToolUse`, nested inside the content block that
    /// was open when the request arrived.
    ToolResult { call_id: CallId, result: ToolResult },
    /// Closes the currently open content block.
    ContentEnd { call_id: CallId },
    /// Closes the current turn. No further content is legal until the next
    /// `PromptStart`.
    PromptEnd { call_id: CallId },
    /// Closes the session. Terminal; no further events may follow for this
    /// call id.
    SessionEnd { call_id: CallId },
}

impl ModelRequestEvent {
    #[must_use]
    pub const fn call_id(&self) -> &CallId {
        match self {
            Self::SessionStart { call_id, .. }
            | Self::PromptStart { call_id }
            | Self::ContentStart { call_id, .. }
            | Self::TextInput { call_id, .. }
            | Self::AudioInput { call_id, .. }
            | Self::ToolResult { call_id, .. }
            | Self::ContentEnd { call_id }
            | Self::PromptEnd { call_id }
            | Self::SessionEnd { call_id } => call_id,
        }
    }
}

/// Events read off the inbound half of the model stream and handed to
/// `SessionCoordinator` / `OutputPacer` for dispatch. This is the demuxed,
/// typed counterpart of the raw event-framed bytes `ModelDriver` parses.
#[derive(Debug, Clone)]
pub enum ModelResponseEvent {
    /// Acknowledges a `SessionStart` or `PromptStart` was accepted.
    Ack { call_id: CallId },
    /// Synthesized speech audio for the current turn, destined for
    /// `OutputPacer`.
    AudioOutput { call_id: CallId, frame: AudioFrame },
    /// A transcript or text completion fragment, forwarded to the
    /// telephony peer as a `text` event rather than paced audio.
    TextOutput { call_id: CallId, text: String },
    /// The model wants a tool executed before it continues.
    ToolUse {
        call_id: CallId,
        request: ToolRequest,
    },
    /// The current turn or session ended, and why.
    Stopped {
        call_id: CallId,
        reason: StopReason,
    },
    /// The model stream reported an error for this call. Non-fatal errors
    /// leave the session open; `SessionCoordinator` decides based on
    /// severity.
    Error { call_id: CallId, message: String },
}

impl ModelResponseEvent {
    #[must_use]
    pub const fn call_id(&self) -> &CallId {
        match self {
            Self::Ack { call_id }
            | Self::AudioOutput { call_id, .. }
            | Self::TextOutput { call_id, .. }
            | Self::ToolUse { call_id, .. }
            | Self::Stopped { call_id, .. }
            | Self::Error { call_id, .. } => call_id,
        }
    }
}
