use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one telephony call end-to-end: from the moment the telephony
/// peer opens its WebSocket until the bridged model session is torn down.
///
/// Wraps the telephony provider's own call identifier rather than minting a
/// fresh one, so provider-side logs and bridge-side logs can be joined on
/// the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(String);

impl CallId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CallId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where a session currently sits in the conversational turn cycle.
///
/// `InputFlow` and `SessionCoordinator` drive transitions between these
/// states; this enum itself carries no behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// No speech detected from the telephony side since the last turn ended.
    Idle,
    /// Audio is actively being forwarded to the model as part of an open turn.
    UserSpeaking,
    /// The model is producing output audio/text for the current turn.
    ModelSpeaking,
    /// The model has requested a tool call and a result is pending.
    AwaitingTool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_id_round_trips_through_display() {
        let id = CallId::new("CA1234567890");
        assert_eq!(id.as_str(), "CA1234567890");
        assert_eq!(format!("{id}"), "CA1234567890");
    }
}
