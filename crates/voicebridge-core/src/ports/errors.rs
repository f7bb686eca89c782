use thiserror::Error;

/// Canonical error taxonomy for the voice bridge.
///
/// Every failure mode a component can produce maps onto exactly one of
/// these variants. Adapters (the telephony WebSocket handler, the model
/// HTTP/2 client) translate `BridgeError` into their own wire-level
/// representation (close codes, HTTP statuses) rather than growing their
/// own parallel error enums.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The telephony peer sent a message that violates the documented
    /// WebSocket event schema (unknown event type, missing required field,
    /// malformed base64 payload).
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// `ModelDriver` observed an event in the outbound or inbound sequence
    /// that the grammar does not permit in the current state.
    #[error("grammar violation: {0}")]
    GrammarViolation(String),

    /// A transport-level failure that is expected to be transient: a
    /// dropped HTTP/2 stream, a reset connection. Callers may retry with
    /// backoff; this is not a reason to fail the whole session outright.
    #[error("transient transport error: {0}")]
    TransientTransport(String),

    /// A deadline (ack timeout, tool timeout, close deadline) elapsed
    /// before the expected event arrived.
    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// A tool ran but failed, or could not be resolved/invoked at all.
    #[error("tool execution failed: {0}")]
    ToolExecutionFailure(String),

    /// A bounded resource (output buffer, input queue, session registry
    /// capacity) is exhausted and the caller must shed load.
    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),

    /// Configuration supplied from outside the process (region, model id,
    /// tool directory) is invalid or missing.
    #[error("invalid external configuration: {0}")]
    ExternalConfigInvalid(String),

    /// Anything that does not fit the categories above. Should be rare;
    /// a growing count of these in logs means the taxonomy is missing a
    /// case, not that callers should special-case this variant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Whether this error should end the session outright, as opposed to
    /// being recoverable within the current turn.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ProtocolViolation(_) | Self::GrammarViolation(_) | Self::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_and_grammar_violations_are_fatal() {
        assert!(BridgeError::ProtocolViolation("bad frame".into()).is_fatal());
        assert!(BridgeError::GrammarViolation("audioInput before promptStart".into()).is_fatal());
    }

    #[test]
    fn timeouts_and_tool_failures_are_recoverable() {
        assert!(!BridgeError::Timeout("tool result".into()).is_fatal());
        assert!(!BridgeError::ToolExecutionFailure("kb lookup failed".into()).is_fatal());
        assert!(!BridgeError::TransientTransport("stream reset".into()).is_fatal());
    }
}
