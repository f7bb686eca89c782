//! Wire representation of the event-framed HTTP/2 protocol spoken with the
//! speech model: newline-delimited JSON frames, one event per line, in
//! both directions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use voicebridge_core::{
    AudioEncoding, AudioFrame, CallId, ContentKind, ContentRole, ModelRequestEvent,
    ModelResponseEvent, StopReason, ToolDescriptor, ToolRequest, ToolResult, ToolStatus,
};

fn role_tag(role: ContentRole) -> &'static str {
    match role {
        ContentRole::System => "system",
        ContentRole::User => "user",
        ContentRole::Assistant => "assistant",
    }
}

fn kind_tag(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Text => "text",
        ContentKind::Audio => "audio",
        ContentKind::Tool => "tool",
    }
}

fn encoding_tag(encoding: AudioEncoding) -> &'static str {
    match encoding {
        AudioEncoding::Mulaw8k => "mulaw8k",
        AudioEncoding::Pcm16Le8k => "pcm16le8k",
        AudioEncoding::Pcm16Le16k => "pcm16le16k",
        AudioEncoding::Pcm16Le24k => "pcm16le24k",
    }
}

fn encoding_from_tag(tag: &str) -> Option<AudioEncoding> {
    match tag {
        "mulaw8k" => Some(AudioEncoding::Mulaw8k),
        "pcm16le8k" => Some(AudioEncoding::Pcm16Le8k),
        "pcm16le16k" => Some(AudioEncoding::Pcm16Le16k),
        "pcm16le24k" => Some(AudioEncoding::Pcm16Le24k),
        _ => None,
    }
}

/// Frames written onto the outbound half of the model stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OutboundFrame {
    SessionStart {
        #[serde(rename = "callId")]
        call_id: String,
        tools: Vec<ToolDescriptor>,
    },
    PromptStart {
        #[serde(rename = "callId")]
        call_id: String,
    },
    ContentStart {
        #[serde(rename = "callId")]
        call_id: String,
        role: &'static str,
        kind: &'static str,
    },
    TextInput {
        #[serde(rename = "callId")]
        call_id: String,
        text: String,
    },
    AudioInput {
        #[serde(rename = "callId")]
        call_id: String,
        encoding: &'static str,
        #[serde(rename = "sampleRateHz")]
        sample_rate_hz: u32,
        /// Base64-encoded raw samples.
        audio: String,
    },
    ToolResult {
        #[serde(rename = "callId")]
        call_id: String,
        #[serde(rename = "toolUseId")]
        tool_use_id: String,
        status: &'static str,
        content: String,
    },
    ContentEnd {
        #[serde(rename = "callId")]
        call_id: String,
    },
    PromptEnd {
        #[serde(rename = "callId")]
        call_id: String,
    },
    SessionEnd {
        #[serde(rename = "callId")]
        call_id: String,
    },
}

impl From<&ModelRequestEvent> for OutboundFrame {
    fn from(event: &ModelRequestEvent) -> Self {
        match event {
            ModelRequestEvent::SessionStart { call_id, tools } => Self::SessionStart {
                call_id: call_id.to_string(),
                tools: tools.clone(),
            },
            ModelRequestEvent::PromptStart { call_id } => Self::PromptStart {
                call_id: call_id.to_string(),
            },
            ModelRequestEvent::ContentStart { call_id, role, kind } => Self::ContentStart {
                call_id: call_id.to_string(),
                role: role_tag(*role),
                kind: kind_tag(*kind),
            },
            ModelRequestEvent::TextInput { call_id, text } => Self::TextInput {
                call_id: call_id.to_string(),
                text: text.clone(),
            },
            ModelRequestEvent::AudioInput { call_id, frame } => Self::AudioInput {
                call_id: call_id.to_string(),
                encoding: encoding_tag(frame.encoding),
                sample_rate_hz: frame.encoding.sample_rate_hz(),
                audio: base64_encode(&frame.samples),
            },
            ModelRequestEvent::ToolResult { call_id, result } => Self::ToolResult {
                call_id: call_id.to_string(),
                tool_use_id: result.tool_use_id.clone(),
                status: match result.status {
                    ToolStatus::Success => "success",
                    ToolStatus::Error => "error",
                },
                content: result.content.clone(),
            },
            ModelRequestEvent::ContentEnd { call_id } => Self::ContentEnd {
                call_id: call_id.to_string(),
            },
            ModelRequestEvent::PromptEnd { call_id } => Self::PromptEnd {
                call_id: call_id.to_string(),
            },
            ModelRequestEvent::SessionEnd { call_id } => Self::SessionEnd {
                call_id: call_id.to_string(),
            },
        }
    }
}

/// Frames read off the inbound half of the model stream.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum InboundFrame {
    Ack {
        #[serde(rename = "callId")]
        call_id: String,
    },
    AudioOutput {
        #[serde(rename = "callId")]
        call_id: String,
        encoding: String,
        audio: String,
    },
    TextOutput {
        #[serde(rename = "callId")]
        call_id: String,
        text: String,
    },
    ToolUse {
        #[serde(rename = "callId")]
        call_id: String,
        #[serde(rename = "toolUseId")]
        tool_use_id: String,
        name: String,
        input: Value,
    },
    Stopped {
        #[serde(rename = "callId")]
        call_id: String,
        reason: String,
    },
    Error {
        #[serde(rename = "callId")]
        call_id: String,
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("unrecognised audio encoding tag: {0}")]
    UnknownEncoding(String),

    #[error("unrecognised stop reason: {0}")]
    UnknownStopReason(String),

    #[error("invalid base64 audio payload: {0}")]
    InvalidAudio(#[from] base64::DecodeError),
}

impl InboundFrame {
    pub fn into_domain(self) -> Result<ModelResponseEvent, WireError> {
        Ok(match self {
            Self::Ack { call_id } => ModelResponseEvent::Ack {
                call_id: CallId::new(call_id),
            },
            Self::AudioOutput {
                call_id,
                encoding,
                audio,
            } => {
                let encoding = encoding_from_tag(&encoding)
                    .ok_or(WireError::UnknownEncoding(encoding))?;
                ModelResponseEvent::AudioOutput {
                    call_id: CallId::new(call_id),
                    frame: AudioFrame::new(encoding, base64_decode(&audio)?),
                }
            }
            Self::TextOutput { call_id, text } => ModelResponseEvent::TextOutput {
                call_id: CallId::new(call_id),
                text,
            },
            Self::ToolUse {
                call_id,
                tool_use_id,
                name,
                input,
            } => ModelResponseEvent::ToolUse {
                call_id: CallId::new(call_id),
                request: ToolRequest {
                    id: tool_use_id,
                    name,
                    input,
                },
            },
            Self::Stopped { call_id, reason } => ModelResponseEvent::Stopped {
                call_id: CallId::new(call_id),
                reason: match reason.as_str() {
                    "end_turn" => StopReason::EndTurn,
                    "interrupted" => StopReason::Interrupted,
                    "tool_use" => StopReason::ToolUse,
                    "session_end" => StopReason::SessionEnd,
                    other => return Err(WireError::UnknownStopReason(other.to_string())),
                },
            },
            Self::Error { call_id, message } => ModelResponseEvent::Error {
                call_id: CallId::new(call_id),
                message,
            },
        })
    }
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn base64_decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicebridge_core::AudioEncoding;

    #[test]
    fn audio_input_round_trips_through_json() {
        let event = ModelRequestEvent::AudioInput {
            call_id: CallId::new("CA1"),
            frame: AudioFrame::new(AudioEncoding::Pcm16Le16k, vec![1, 2, 3, 4]),
        };
        let frame = OutboundFrame::from(&event);
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"event\":\"audioInput\""));
        assert!(json.contains("\"sampleRateHz\":16000"));
    }

    #[test]
    fn tool_use_inbound_frame_parses_into_domain() {
        let json = r#"{"event":"toolUse","callId":"CA1","toolUseId":"t1","name":"lookup","input":{"query":"hi"}}"#;
        let frame: InboundFrame = serde_json::from_str(json).unwrap();
        let event = frame.into_domain().unwrap();
        assert!(matches!(event, ModelResponseEvent::ToolUse { .. }));
    }

    #[test]
    fn unknown_stop_reason_is_rejected() {
        let json = r#"{"event":"stopped","callId":"CA1","reason":"mystery"}"#;
        let frame: InboundFrame = serde_json::from_str(json).unwrap();
        assert!(matches!(
            frame.into_domain(),
            Err(WireError::UnknownStopReason(_))
        ));
    }
}
