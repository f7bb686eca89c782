//! Legal event ordering for a single call's model stream.
//!
//! `ModelDriver` runs one `Grammar` per call id and rejects any event that
//! would not be legal in the current state, in either direction, before it
//! ever touches the wire. A grammar violation is always fatal: it means
//! this driver and the model have disagreed about what turn they are in,
//! and nothing downstream can be trusted to recover from that on its own.

use voicebridge_core::{
    BridgeError, ContentKind, ContentRole, ModelRequestEvent, ModelResponseEvent, StopReason,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No `SessionStart` sent yet.
    Unopened,
    /// Session open, no turn in progress.
    SessionOpen,
    /// `PromptStart` sent, waiting for the model's ack.
    AwaitingPromptAck,
    /// Prompt open, no content block currently open.
    PromptOpen,
    /// A content block is open; `role`/`kind` gate which payload event
    /// (`TextInput` vs `AudioInput`) is legal next.
    ContentOpen { role: ContentRole, kind: ContentKind },
    /// `SessionEnd` sent or `Stopped{SessionEnd}` received; terminal.
    Closed,
}

/// Legal event ordering for a single call's model stream, plus the
/// bookkeeping a flat `State` enum can't express on its own: whether the
/// mandatory system/text content for the current prompt has already been
/// sent, and which tool-use request (if any) the currently open content
/// block is waiting on a matching `ToolResult` for.
pub struct Grammar {
    state: State,
    first_content_sent: bool,
    pending_tool_id: Option<String>,
}

impl Grammar {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Unopened,
            first_content_sent: false,
            pending_tool_id: None,
        }
    }

    /// Validate (and, if legal, apply) the effect of sending `event`.
    pub fn validate_outbound(&mut self, event: &ModelRequestEvent) -> Result<(), BridgeError> {
        use ModelRequestEvent::{
            AudioInput, ContentEnd, ContentStart, PromptEnd, PromptStart, SessionEnd,
            SessionStart, TextInput, ToolResult,
        };

        if let (State::ContentOpen { .. }, ToolResult { result, .. }) = (self.state, event) {
            return match &self.pending_tool_id {
                Some(id) if *id == result.tool_use_id => {
                    self.pending_tool_id = None;
                    Ok(())
                }
                _ => Err(BridgeError::GrammarViolation(format!(
                    "toolResult for {} has no matching pending toolUse",
                    result.tool_use_id
                ))),
            };
        }

        let next = match (self.state, event) {
            (State::Unopened, SessionStart { .. }) => State::SessionOpen,
            (State::SessionOpen, PromptStart { .. }) => {
                self.first_content_sent = false;
                State::AwaitingPromptAck
            }
            (State::PromptOpen, ContentStart { role, kind, .. }) => {
                if !self.first_content_sent
                    && (*role != ContentRole::System || *kind != ContentKind::Text)
                {
                    return Err(BridgeError::GrammarViolation(format!(
                        "first content of a prompt must be role=system, kind=text, got {role:?}/{kind:?}"
                    )));
                }
                self.first_content_sent = true;
                State::ContentOpen {
                    role: *role,
                    kind: *kind,
                }
            }
            (State::ContentOpen { kind: ContentKind::Text, .. }, TextInput { .. }) => self.state,
            (State::ContentOpen { kind: ContentKind::Audio, .. }, AudioInput { .. }) => self.state,
            (State::ContentOpen { .. }, ContentEnd { .. }) => State::PromptOpen,
            (State::PromptOpen, PromptEnd { .. }) => State::SessionOpen,
            (
                State::SessionOpen | State::AwaitingPromptAck | State::PromptOpen,
                SessionEnd { .. },
            ) => State::Closed,
            (state, event) => {
                return Err(BridgeError::GrammarViolation(format!(
                    "{event:?} is not legal while outbound state is {state:?}"
                )));
            }
        };
        self.state = next;
        Ok(())
    }

    /// Validate (and, if legal, apply) the effect of receiving `event`.
    pub fn validate_inbound(&mut self, event: &ModelResponseEvent) -> Result<(), BridgeError> {
        use ModelResponseEvent::{Ack, AudioOutput, Error, Stopped, TextOutput, ToolUse};

        if let (State::ContentOpen { .. }, ToolUse { request, .. }) = (self.state, event) {
            self.pending_tool_id = Some(request.id.clone());
            return Ok(());
        }

        let next = match (self.state, event) {
            (State::AwaitingPromptAck, Ack { .. }) => State::PromptOpen,
            (
                State::SessionOpen | State::PromptOpen | State::ContentOpen { .. },
                AudioOutput { .. } | TextOutput { .. },
            ) => self.state,
            (
                State::SessionOpen | State::PromptOpen | State::ContentOpen { .. },
                Stopped {
                    reason: StopReason::EndTurn | StopReason::Interrupted,
                    ..
                },
            ) => State::SessionOpen,
            (
                _,
                Stopped {
                    reason: StopReason::SessionEnd,
                    ..
                },
            ) => State::Closed,
            // Errors never change the grammar state; SessionCoordinator
            // decides whether to continue or tear the session down.
            (state, Error { .. }) => state,
            (state, event) => {
                return Err(BridgeError::GrammarViolation(format!(
                    "{event:?} is not legal while inbound state is {state:?}"
                )));
            }
        };
        self.state = next;
        Ok(())
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicebridge_core::{AudioEncoding, AudioFrame, CallId, ContentKind, ContentRole, ToolResult};

    fn call_id() -> CallId {
        CallId::new("CA1")
    }

    fn open_session_and_prompt(grammar: &mut Grammar) {
        grammar
            .validate_outbound(&ModelRequestEvent::SessionStart {
                call_id: call_id(),
                tools: Vec::new(),
            })
            .unwrap();
        grammar
            .validate_outbound(&ModelRequestEvent::PromptStart {
                call_id: call_id(),
            })
            .unwrap();
        grammar
            .validate_inbound(&ModelResponseEvent::Ack {
                call_id: call_id(),
            })
            .unwrap();
    }

    fn open_system_prompt_content(grammar: &mut Grammar) {
        grammar
            .validate_outbound(&ModelRequestEvent::ContentStart {
                call_id: call_id(),
                role: ContentRole::System,
                kind: ContentKind::Text,
            })
            .unwrap();
        grammar
            .validate_outbound(&ModelRequestEvent::TextInput {
                call_id: call_id(),
                text: "be helpful".into(),
            })
            .unwrap();
        grammar
            .validate_outbound(&ModelRequestEvent::ContentEnd {
                call_id: call_id(),
            })
            .unwrap();
    }

    #[test]
    fn happy_path_session_and_turn() {
        let mut grammar = Grammar::new();
        open_session_and_prompt(&mut grammar);
        open_system_prompt_content(&mut grammar);

        grammar
            .validate_outbound(&ModelRequestEvent::ContentStart {
                call_id: call_id(),
                role: ContentRole::User,
                kind: ContentKind::Audio,
            })
            .unwrap();
        grammar
            .validate_outbound(&ModelRequestEvent::AudioInput {
                call_id: call_id(),
                frame: AudioFrame::new(AudioEncoding::Pcm16Le16k, vec![0u8; 4]),
            })
            .unwrap();
        grammar
            .validate_outbound(&ModelRequestEvent::ContentEnd {
                call_id: call_id(),
            })
            .unwrap();
        grammar
            .validate_outbound(&ModelRequestEvent::PromptEnd {
                call_id: call_id(),
            })
            .unwrap();
        grammar
            .validate_inbound(&ModelResponseEvent::Stopped {
                call_id: call_id(),
                reason: StopReason::EndTurn,
            })
            .unwrap();
        grammar
            .validate_outbound(&ModelRequestEvent::SessionEnd {
                call_id: call_id(),
            })
            .unwrap();
        assert!(grammar.is_closed());
    }

    #[test]
    fn audio_input_before_prompt_start_is_a_violation() {
        let mut grammar = Grammar::new();
        grammar
            .validate_outbound(&ModelRequestEvent::SessionStart {
                call_id: call_id(),
                tools: Vec::new(),
            })
            .unwrap();
        let result = grammar.validate_outbound(&ModelRequestEvent::AudioInput {
            call_id: call_id(),
            frame: AudioFrame::new(AudioEncoding::Pcm16Le16k, vec![0u8; 4]),
        });
        assert!(matches!(result, Err(BridgeError::GrammarViolation(_))));
    }

    #[test]
    fn first_content_of_a_prompt_must_be_system_text() {
        let mut grammar = Grammar::new();
        open_session_and_prompt(&mut grammar);

        let result = grammar.validate_outbound(&ModelRequestEvent::ContentStart {
            call_id: call_id(),
            role: ContentRole::User,
            kind: ContentKind::Audio,
        });
        assert!(matches!(result, Err(BridgeError::GrammarViolation(_))));
    }

    #[test]
    fn tool_result_requires_a_preceding_tool_use() {
        let mut grammar = Grammar::new();
        open_session_and_prompt(&mut grammar);
        open_system_prompt_content(&mut grammar);
        grammar
            .validate_outbound(&ModelRequestEvent::ContentStart {
                call_id: call_id(),
                role: ContentRole::User,
                kind: ContentKind::Audio,
            })
            .unwrap();

        let premature = grammar.validate_outbound(&ModelRequestEvent::ToolResult {
            call_id: call_id(),
            result: ToolResult::success("t1", "ok"),
        });
        assert!(matches!(premature, Err(BridgeError::GrammarViolation(_))));

        grammar
            .validate_inbound(&ModelResponseEvent::ToolUse {
                call_id: call_id(),
                request: voicebridge_core::ToolRequest {
                    id: "t1".into(),
                    name: "lookup".into(),
                    input: serde_json::json!({}),
                },
            })
            .unwrap();
        grammar
            .validate_outbound(&ModelRequestEvent::ToolResult {
                call_id: call_id(),
                result: ToolResult::success("t1", "ok"),
            })
            .unwrap();
    }

    #[test]
    fn errors_do_not_change_state() {
        let mut grammar = Grammar::new();
        grammar
            .validate_outbound(&ModelRequestEvent::SessionStart {
                call_id: call_id(),
                tools: Vec::new(),
            })
            .unwrap();
        grammar
            .validate_inbound(&ModelResponseEvent::Error {
                call_id: call_id(),
                message: "transient".into(),
            })
            .unwrap();
        grammar
            .validate_outbound(&ModelRequestEvent::PromptStart {
                call_id: call_id(),
            })
            .unwrap();
    }
}
