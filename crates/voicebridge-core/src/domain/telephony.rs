/// Identifiers and advertised parameters captured from the telephony
/// peer's `start` handshake.
///
/// `sample_rate_hz` is carried purely for logging: per the telephony
/// interface the bridge always treats inbound media as 8 kHz mu-law
/// regardless of what the peer advertises here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartParams {
    pub stream_sid: String,
    pub call_sid: String,
    pub sample_rate_hz: Option<u32>,
}

/// One parsed inbound control message from the telephony WebSocket, after
/// JSON parsing and base64 decoding by the transport adapter.
///
/// Anything that does not parse into one of these shapes is a protocol
/// violation raised at the adapter boundary; `InputFlow` never sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelephonyInboundEvent {
    Connected,
    Start(StartParams),
    /// Raw mu-law@8k bytes, already base64-decoded.
    Media { payload: Vec<u8> },
    Stop,
    Mark { name: String },
    Dtmf { digit: String },
}

/// One outbound message `OutputPacer` or the session lifecycle driver
/// hands to the telephony transport. `payload` is raw mu-law bytes;
/// base64-encoding the wire envelope is the transport adapter's job, the
/// same way wire framing is `ModelDriver`'s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelephonyOutboundEvent {
    Media {
        stream_sid: String,
        payload: Vec<u8>,
        sequence: u64,
    },
    Mark {
        stream_sid: String,
        name: String,
    },
}

/// WebSocket close codes the bridge emits on the telephony socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCode {
    Normal,
    InvalidMessage,
    PolicyViolation,
    Internal,
}

impl CloseCode {
    /// The numeric WebSocket close code, per the telephony interface.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Normal => 1000,
            Self::InvalidMessage => 1003,
            Self::PolicyViolation => 1008,
            Self::Internal => 1011,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_codes_match_the_telephony_interface() {
        assert_eq!(CloseCode::Normal.code(), 1000);
        assert_eq!(CloseCode::InvalidMessage.code(), 1003);
        assert_eq!(CloseCode::PolicyViolation.code(), 1008);
        assert_eq!(CloseCode::Internal.code(), 1011);
    }
}
