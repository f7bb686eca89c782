//! `SessionCoordinator`: wires one telephony call's ingress, model stream,
//! and output pacing together for the life of the call.
//!
//! A session is five concurrent activities sharing one cancellation
//! token: the ingress reader (telephony audio in, turn boundaries, and the
//! silence timer that closes a turn — all tightly coupled, so they live
//! together in [`InputFlow`]), the model response reader (dispatches
//! audio/text/tool/control events as they arrive), the output pacer, the
//! egress writer (paced audio back out to the telephony peer), and the
//! lifecycle sequencing that opens the session before any of the others
//! start and tears every one of them down, in order, once any of them
//! ends.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use voicebridge_core::{
    AppEventEmitter, BridgeConfig, BridgeError, BridgeEvent, CallId, CloseCode, ContentKind,
    ContentRole, KnowledgeServicePort, ModelRequestEvent, ModelResponseEvent, StopReason,
    TelephonyOutboundEvent, TelephonyReceiver, TelephonySender, ToolDirectoryPort,
};
use voicebridge_model::{ModelCallHandle, ModelDriver, RequestStream};
use voicebridge_pacer::{OutputPacer, PacerOutput};
use voicebridge_tools::ToolRunner;

use crate::input_flow::{IngressOutcome, InputFlow, TurnSignal};
use crate::registry::SessionRegistry;

/// Capacity of the channel carrying paced telephony audio from
/// `OutputPacer` to the egress writer.
const PACER_OUTPUT_CAPACITY: usize = 64;
/// Capacity of the channel the model-response reader uses to tell
/// `InputFlow` about acks and model-initiated turn endings.
const TURN_SIGNAL_CAPACITY: usize = 8;

/// Everything `SessionCoordinator` needs to drive one call end to end.
pub struct SessionDeps {
    pub call_id: CallId,
    pub stream_sid: String,
    pub telephony_rx: Box<dyn TelephonyReceiver>,
    pub telephony_tx: Arc<dyn TelephonySender>,
    pub model: Arc<ModelDriver>,
    pub knowledge: Arc<dyn KnowledgeServicePort>,
    pub directory: Arc<dyn ToolDirectoryPort>,
    pub registry: Arc<SessionRegistry>,
    pub config: BridgeConfig,
    pub emitter: Arc<dyn AppEventEmitter>,
    /// Shared with the `SessionHandle` already registered in `registry`,
    /// so an external shutdown (peer hangup detected elsewhere, process
    /// shutdown) and this session's own fatal errors converge on the same
    /// teardown path.
    pub cancel: CancellationToken,
}

/// Drives a single call's session from the moment its model stream opens
/// to the moment its telephony socket closes.
pub struct SessionCoordinator {
    deps: SessionDeps,
}

impl SessionCoordinator {
    #[must_use]
    pub fn new(deps: SessionDeps) -> Self {
        Self { deps }
    }

    /// Run the session to completion. Never panics; every failure mode
    /// degrades to a telephony close with the appropriate code and the
    /// call being deregistered.
    pub async fn run(self) {
        let SessionDeps {
            call_id,
            stream_sid,
            telephony_rx,
            telephony_tx,
            model,
            knowledge,
            directory,
            registry,
            config,
            emitter,
            cancel,
        } = self.deps;

        emitter.emit(BridgeEvent::SessionStarted {
            call_id: call_id.clone(),
        });

        let call_handle = match model.open_call(call_id.clone()).await {
            Ok(handle) => handle,
            Err(error) => {
                tracing::warn!(%call_id, %error, "failed to open model call");
                telephony_tx.close(CloseCode::Internal, "model unavailable").await;
                registry.unregister(&call_id).await;
                return;
            }
        };
        let ModelCallHandle {
            requests,
            audio_and_text,
            tool_use,
            control,
        } = call_handle;

        if let Err(error) = requests
            .send_control(ModelRequestEvent::SessionStart {
                call_id: call_id.clone(),
                tools: directory.enabled_tools(),
            })
            .await
        {
            tracing::warn!(%call_id, %error, "model rejected session start");
            telephony_tx.close(CloseCode::Internal, "model rejected session start").await;
            registry.unregister(&call_id).await;
            return;
        }

        let (turn_signal_tx, turn_signal_rx) = mpsc::channel(TURN_SIGNAL_CAPACITY);
        let (pacer_tx, pacer_rx) = mpsc::channel(PACER_OUTPUT_CAPACITY);

        let pacer = Arc::new(OutputPacer::new(
            call_id.clone(),
            config.pacer,
            pacer_tx,
            cancel.clone(),
            Arc::clone(&emitter),
        ));
        let tool_runner = Arc::new(ToolRunner::new(
            call_id.clone(),
            knowledge,
            Arc::clone(&directory),
            config.tool,
            Arc::clone(&emitter),
        ));

        let input_flow = InputFlow::new(
            call_id.clone(),
            telephony_rx,
            Arc::clone(&requests),
            turn_signal_rx,
            config.turn,
            config.input,
            config.model.system_prompt.clone(),
            config.session.ack_timeout_ms,
            cancel.clone(),
            Arc::clone(&emitter),
        );

        let pacer_task = tokio::spawn(Arc::clone(&pacer).run());
        let egress_task = tokio::spawn(run_egress(
            pacer_rx,
            Arc::clone(&telephony_tx),
            stream_sid.clone(),
        ));
        let response_task = tokio::spawn(run_model_responses(
            call_id.clone(),
            audio_and_text,
            tool_use,
            control,
            Arc::clone(&pacer),
            tool_runner,
            Arc::clone(&requests),
            turn_signal_tx,
            cancel.clone(),
            Arc::clone(&emitter),
        ));

        let ingress_result = input_flow.run().await;
        cancel.cancel();

        // Stop pacer and drop whatever it had buffered: the telephony peer
        // is going away, so nothing more needs to reach the wire.
        pacer.stop("session ending");

        // Close the model stream, best-effort: the peer may already be
        // gone, in which case this is a no-op.
        let _ = requests
            .send_control(ModelRequestEvent::SessionEnd {
                call_id: call_id.clone(),
            })
            .await;

        let close_deadline = Duration::from_millis(u64::from(config.session.close_deadline_ms));
        let _ = tokio::time::timeout(close_deadline, async {
            let _ = response_task.await;
            let _ = pacer_task.await;
            let _ = egress_task.await;
        })
        .await;

        let (close_code, reason) = close_outcome(&ingress_result);
        telephony_tx.close(close_code, &reason).await;
        registry.unregister(&call_id).await;
        emitter.emit(BridgeEvent::SessionEnded { call_id, reason });
    }
}

fn close_outcome(result: &Result<IngressOutcome, BridgeError>) -> (CloseCode, String) {
    match result {
        Ok(IngressOutcome::Stopped) => (CloseCode::Normal, "call ended".into()),
        Ok(IngressOutcome::TransportClosed) => (CloseCode::Normal, "peer disconnected".into()),
        Ok(IngressOutcome::Cancelled) => (CloseCode::Normal, "session cancelled".into()),
        Err(BridgeError::ProtocolViolation(detail)) => {
            (CloseCode::InvalidMessage, detail.clone())
        }
        Err(error) => (CloseCode::Internal, error.to_string()),
    }
}

/// Drains paced telephony audio and hands it to the transport. Ends when
/// `OutputPacer` stops and drops its sender half.
async fn run_egress(
    mut pacer_rx: mpsc::Receiver<PacerOutput>,
    telephony_tx: Arc<dyn TelephonySender>,
    stream_sid: String,
) {
    while let Some(output) = pacer_rx.recv().await {
        let event = match output {
            PacerOutput::Media { payload, sequence } => TelephonyOutboundEvent::Media {
                stream_sid: stream_sid.clone(),
                payload,
                sequence,
            },
            PacerOutput::Mark { name, .. } => TelephonyOutboundEvent::Mark {
                stream_sid: stream_sid.clone(),
                name,
            },
        };
        if telephony_tx.send(event).await.is_err() {
            return;
        }
    }
}

/// Reads the three inbound mailboxes `ModelDriver` demultiplexes into and
/// dispatches each event to the right collaborator: synthesized audio to
/// `OutputPacer`, tool calls to `ToolRunner` (and the result back onto the
/// model stream), and turn/session control signals to `InputFlow` via
/// `turn_signals`.
#[allow(clippy::too_many_arguments)]
async fn run_model_responses(
    call_id: CallId,
    mut audio_and_text: mpsc::Receiver<ModelResponseEvent>,
    mut tool_use: mpsc::Receiver<ModelResponseEvent>,
    mut control: mpsc::Receiver<ModelResponseEvent>,
    pacer: Arc<OutputPacer>,
    tool_runner: Arc<ToolRunner>,
    requests: Arc<RequestStream>,
    turn_signals: mpsc::Sender<TurnSignal>,
    cancel: CancellationToken,
    emitter: Arc<dyn AppEventEmitter>,
) {
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => return,

            event = control.recv() => {
                let Some(event) = event else { return };
                match event {
                    ModelResponseEvent::Ack { .. } => {
                        let _ = turn_signals.send(TurnSignal::PromptAcked).await;
                    }
                    ModelResponseEvent::Stopped { reason: StopReason::SessionEnd, .. } => {
                        return;
                    }
                    ModelResponseEvent::Stopped { reason: StopReason::Interrupted, .. } => {
                        pacer.interrupt().await;
                        let _ = turn_signals.send(TurnSignal::TurnEndedByModel).await;
                    }
                    ModelResponseEvent::Stopped { reason: StopReason::EndTurn, .. } => {
                        if let Err(error) = pacer.flush("turn-end").await {
                            tracing::warn!(%call_id, %error, "failed to flush pacer on turn end");
                            return;
                        }
                        let _ = turn_signals.send(TurnSignal::TurnEndedByModel).await;
                    }
                    ModelResponseEvent::Stopped { reason: StopReason::ToolUse, .. } => {
                        // The model paused for a tool result; the matching
                        // `ToolUse` event itself arrives on the tool_use
                        // mailbox, handled below.
                    }
                    ModelResponseEvent::Error { message, .. } => {
                        emitter.emit(BridgeEvent::ModelStreamError {
                            call_id: call_id.clone(),
                            detail: message,
                        });
                    }
                    ModelResponseEvent::AudioOutput { .. } | ModelResponseEvent::TextOutput { .. }
                    | ModelResponseEvent::ToolUse { .. } => {}
                }
            }

            event = audio_and_text.recv() => {
                let Some(event) = event else { return };
                match event {
                    ModelResponseEvent::AudioOutput { frame, .. } => {
                        if let Err(error) = pacer.enqueue(&frame).await {
                            tracing::warn!(%call_id, %error, "failed to enqueue model audio");
                        }
                    }
                    ModelResponseEvent::TextOutput { .. } => {
                        // Transcript fragments are observability-only; no
                        // downstream consumer in this bridge today.
                    }
                    _ => {}
                }
            }

            event = tool_use.recv() => {
                let Some(event) = event else { return };
                if let ModelResponseEvent::ToolUse { request, .. } = event {
                    let result = tool_runner.execute(request).await;
                    if let Err(error) = requests
                        .send_control(ModelRequestEvent::ToolResult {
                            call_id: call_id.clone(),
                            result,
                        })
                        .await
                    {
                        tracing::warn!(%call_id, %error, "failed to send tool result");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use voicebridge_core::{
        KnowledgeError, KnowledgeHit, KnowledgeQuery, NoopEmitter, ToolDescriptor, ToolRequest,
    };
    use voicebridge_model::Grammar;
    use voicebridge_tools::StaticToolDirectory;

    #[derive(Default)]
    struct RecordingSender {
        sent: StdMutex<Vec<TelephonyOutboundEvent>>,
    }

    #[async_trait]
    impl TelephonySender for RecordingSender {
        async fn send(&self, event: TelephonyOutboundEvent) -> Result<(), BridgeError> {
            self.sent.lock().unwrap().push(event);
            Ok(())
        }

        async fn close(&self, _code: CloseCode, _reason: &str) {}
    }

    struct StubKnowledge;

    #[async_trait]
    impl KnowledgeServicePort for StubKnowledge {
        async fn retrieve(
            &self,
            _query: KnowledgeQuery,
        ) -> Result<Vec<KnowledgeHit>, KnowledgeError> {
            Ok(vec![KnowledgeHit {
                text: "the answer".into(),
                score: 0.9,
                source: None,
            }])
        }
    }

    fn tool_runner() -> Arc<ToolRunner> {
        let directory = Arc::new(StaticToolDirectory::new(vec![(
            ToolDescriptor {
                name: "company_policies".into(),
                description: "looks up policy".into(),
                input_schema: json!({"type": "object"}),
            },
            "kb-policies".into(),
        )]));
        Arc::new(ToolRunner::new(
            CallId::new("CA1"),
            Arc::new(StubKnowledge),
            directory,
            Default::default(),
            Arc::new(NoopEmitter::new()),
        ))
    }

    #[tokio::test]
    async fn egress_translates_pacer_output_into_telephony_events() {
        let (tx, rx) = mpsc::channel(8);
        let sender = Arc::new(RecordingSender::default());
        let sender_handle: Arc<dyn TelephonySender> = Arc::clone(&sender);

        tx.send(PacerOutput::Media {
            payload: vec![1, 2, 3],
            sequence: 1,
        })
        .await
        .unwrap();
        tx.send(PacerOutput::Mark {
            name: "done".into(),
            sequence: 2,
        })
        .await
        .unwrap();
        drop(tx);

        run_egress(rx, sender_handle, "S1".into()).await;

        let recorded = sender.sent.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        assert!(matches!(recorded[0], TelephonyOutboundEvent::Media { .. }));
        assert!(matches!(recorded[1], TelephonyOutboundEvent::Mark { .. }));
    }

    #[tokio::test]
    async fn tool_use_dispatches_through_tool_runner_and_sends_a_result() {
        let grammar = Arc::new(tokio::sync::Mutex::new(Grammar::new()));
        let (requests, mut priority_rx, _audio_rx) = RequestStream::new(grammar.clone());
        let requests = Arc::new(requests);
        grammar
            .lock()
            .await
            .validate_outbound(&ModelRequestEvent::SessionStart {
                call_id: CallId::new("CA1"),
                tools: Vec::new(),
            })
            .unwrap();
        grammar
            .lock()
            .await
            .validate_outbound(&ModelRequestEvent::PromptStart {
                call_id: CallId::new("CA1"),
            })
            .unwrap();
        grammar
            .lock()
            .await
            .validate_inbound(&ModelResponseEvent::Ack {
                call_id: CallId::new("CA1"),
            })
            .unwrap();
        grammar
            .lock()
            .await
            .validate_outbound(&ModelRequestEvent::ContentStart {
                call_id: CallId::new("CA1"),
                role: ContentRole::System,
                kind: ContentKind::Text,
            })
            .unwrap();
        grammar
            .lock()
            .await
            .validate_outbound(&ModelRequestEvent::TextInput {
                call_id: CallId::new("CA1"),
                text: "be helpful".into(),
            })
            .unwrap();
        grammar
            .lock()
            .await
            .validate_outbound(&ModelRequestEvent::ContentEnd {
                call_id: CallId::new("CA1"),
            })
            .unwrap();
        grammar
            .lock()
            .await
            .validate_outbound(&ModelRequestEvent::ContentStart {
                call_id: CallId::new("CA1"),
                role: ContentRole::User,
                kind: ContentKind::Audio,
            })
            .unwrap();
        grammar
            .lock()
            .await
            .validate_inbound(&ModelResponseEvent::ToolUse {
                call_id: CallId::new("CA1"),
                request: ToolRequest {
                    id: "t1".into(),
                    name: "company_policies".into(),
                    input: json!({"query": "vacation"}),
                },
            })
            .unwrap();

        // Keep `_audio_tx`/`_control_tx` alive for the duration of the
        // call: a closed mailbox resolves `recv()` to `None` immediately,
        // which (being `biased`) would starve the `tool_use` branch below
        // before it ever got polled.
        let (_audio_tx, audio_rx) = mpsc::channel(8);
        let (tool_tx, tool_rx) = mpsc::channel(8);
        let (_control_tx, control_rx) = mpsc::channel(8);
        let (turn_tx, mut turn_rx) = mpsc::channel(8);
        let pacer_config = voicebridge_core::PacerConfig::default();
        let (pacer_out_tx, _pacer_out_rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let pacer = Arc::new(OutputPacer::new(
            CallId::new("CA1"),
            pacer_config,
            pacer_out_tx,
            cancel.clone(),
            Arc::new(NoopEmitter::new()),
        ));

        let handle = tokio::spawn(run_model_responses(
            CallId::new("CA1"),
            audio_rx,
            tool_rx,
            control_rx,
            pacer,
            tool_runner(),
            Arc::clone(&requests),
            turn_tx,
            cancel.clone(),
            Arc::new(NoopEmitter::new()),
        ));

        tool_tx
            .send(ModelResponseEvent::ToolUse {
                call_id: CallId::new("CA1"),
                request: ToolRequest {
                    id: "t1".into(),
                    name: "company_policies".into(),
                    input: json!({"query": "vacation"}),
                },
            })
            .await
            .unwrap();

        let sent = priority_rx.recv().await.unwrap();
        assert!(matches!(sent, ModelRequestEvent::ToolResult { .. }));
        assert!(turn_rx.try_recv().is_err());

        cancel.cancel();
        handle.await.unwrap();
    }
}
