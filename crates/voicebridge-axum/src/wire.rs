//! JSON wire shapes for the telephony WebSocket, per the `event`-discriminated
//! control-message protocol: text frames carry one of these tagged shapes in
//! either direction, matching the model stream's own tagged-frame convention
//! one crate over.

use serde::{Deserialize, Serialize};

/// One parsed inbound control message, before it is translated into a
/// `voicebridge_core::TelephonyInboundEvent`. Kept as its own type (rather
/// than deserializing directly into the domain enum) so wire-shape details
/// — nested `start`/`media`/`mark`/`dtmf` objects, base64 payloads — never
/// leak into the domain.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum InboundFrame {
    Connected,
    Start {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        start: StartBody,
    },
    Media {
        media: MediaBody,
    },
    Stop,
    Mark {
        mark: MarkBody,
    },
    Dtmf {
        dtmf: DtmfBody,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartBody {
    #[serde(rename = "callSid")]
    pub call_sid: String,
    #[serde(default)]
    pub sample_rate_hz: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaBody {
    pub track: String,
    pub payload: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkBody {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DtmfBody {
    pub digit: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid JSON control message: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("media event missing an inbound track")]
    NotInboundTrack,

    #[error("invalid base64 media payload: {0}")]
    InvalidAudio(#[from] base64::DecodeError),

    #[error("start handshake missing a call identifier")]
    MissingCallId,
}

/// Outbound control message shapes, matching §6 of the telephony interface
/// exactly (`sequenceNumber` is serialized as a JSON string, as the peer
/// expects).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum OutboundFrame {
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMediaBody,
        #[serde(rename = "sequenceNumber")]
        sequence_number: String,
    },
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkBody,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundMediaBody {
    pub payload: String,
}

fn base64_decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(text)
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

impl InboundFrame {
    /// Parse one telephony text frame. A frame that is not valid JSON, or
    /// not one of the recognised `event` shapes, is always a wire-level
    /// error — the caller maps it to a protocol-violation close, exactly
    /// as malformed frames are handled at every other adapter boundary in
    /// this workspace.
    pub fn parse(text: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn into_domain(self) -> Result<voicebridge_core::TelephonyInboundEvent, WireError> {
        use voicebridge_core::{StartParams, TelephonyInboundEvent};

        Ok(match self {
            Self::Connected => TelephonyInboundEvent::Connected,
            Self::Start { stream_sid, start } => {
                if start.call_sid.is_empty() {
                    return Err(WireError::MissingCallId);
                }
                TelephonyInboundEvent::Start(StartParams {
                    stream_sid,
                    call_sid: start.call_sid,
                    sample_rate_hz: start.sample_rate_hz,
                })
            }
            Self::Media { media } => {
                if !media.track.contains("inbound") {
                    return Err(WireError::NotInboundTrack);
                }
                TelephonyInboundEvent::Media {
                    payload: base64_decode(&media.payload)?,
                }
            }
            Self::Stop => TelephonyInboundEvent::Stop,
            Self::Mark { mark } => TelephonyInboundEvent::Mark { name: mark.name },
            Self::Dtmf { dtmf } => TelephonyInboundEvent::Dtmf { digit: dtmf.digit },
        })
    }
}

impl From<&voicebridge_core::TelephonyOutboundEvent> for OutboundFrame {
    fn from(event: &voicebridge_core::TelephonyOutboundEvent) -> Self {
        match event {
            voicebridge_core::TelephonyOutboundEvent::Media {
                stream_sid,
                payload,
                sequence,
            } => Self::Media {
                stream_sid: stream_sid.clone(),
                media: OutboundMediaBody {
                    payload: base64_encode(payload),
                },
                sequence_number: sequence.to_string(),
            },
            voicebridge_core::TelephonyOutboundEvent::Mark { stream_sid, name } => Self::Mark {
                stream_sid: stream_sid.clone(),
                mark: MarkBody { name: name.clone() },
            },
        }
    }
}
