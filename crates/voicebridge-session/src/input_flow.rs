//! Telephony ingress state machine and turn manager.
//!
//! Reads already-typed telephony events (the transport adapter owns JSON
//! parsing and base64 decoding), transcodes inbound media to the model's
//! input rate, and drives user-turn boundaries against the outbound model
//! grammar via [`RequestStream`].

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Sleep, sleep};
use tokio_util::sync::CancellationToken;

use voicebridge_codec::mulaw8k_to_pcm16_16k;
use voicebridge_core::{
    AppEventEmitter, AudioEncoding, AudioFrame, BridgeError, BridgeEvent, CallId, ContentKind,
    ContentRole, ForwardingMode, InputConfig, ModelRequestEvent, TelephonyInboundEvent,
    TelephonyReceiver, TurnConfig,
};
use voicebridge_model::RequestStream;

/// Signalled by `SessionCoordinator`'s model-response reader so `InputFlow`
/// knows when it is safe to forward audio for the turn it just opened, and
/// when the model ended a turn on its own (so the next inbound frame should
/// open a fresh one).
#[derive(Debug, Clone, Copy)]
pub enum TurnSignal {
    /// The model acknowledged the most recently sent `PromptStart`.
    PromptAcked,
    /// The model's turn ended (`Stopped{EndTurn}` or `Stopped{Interrupted}`).
    TurnEndedByModel,
}

/// Outcome of one ingress loop iteration to completion, for
/// `SessionCoordinator` to decide how the telephony socket should close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngressOutcome {
    /// The peer sent `stop`; end the call gracefully.
    Stopped,
    /// The transport itself closed (peer hung up without `stop`).
    TransportClosed,
    /// The session's cancellation token tripped.
    Cancelled,
}

enum Phase {
    Idle,
    AwaitingAck { pending: Vec<AudioFrame> },
    Open,
}

pub struct InputFlow {
    call_id: CallId,
    receiver: Box<dyn TelephonyReceiver>,
    requests: Arc<RequestStream>,
    turn_signals: mpsc::Receiver<TurnSignal>,
    turn: TurnConfig,
    input: InputConfig,
    /// Sent as the first content block (`role: System, kind: Text`) of
    /// every prompt, once the model has acked the `PromptStart` that opened
    /// it.
    system_prompt: String,
    /// How long to wait for the model's `Ack` after `PromptStart` before
    /// giving up on the turn.
    ack_timeout_ms: u32,
    cancel: CancellationToken,
    emitter: Arc<dyn AppEventEmitter>,
}

impl InputFlow {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        call_id: CallId,
        receiver: Box<dyn TelephonyReceiver>,
        requests: Arc<RequestStream>,
        turn_signals: mpsc::Receiver<TurnSignal>,
        turn: TurnConfig,
        input: InputConfig,
        system_prompt: String,
        ack_timeout_ms: u32,
        cancel: CancellationToken,
        emitter: Arc<dyn AppEventEmitter>,
    ) -> Self {
        Self {
            call_id,
            receiver,
            requests,
            turn_signals,
            turn,
            input,
            system_prompt,
            ack_timeout_ms,
            cancel,
            emitter,
        }
    }

    /// Drive the ingress loop until the peer hangs up, sends `stop`, or the
    /// session is cancelled.
    pub async fn run(mut self) -> Result<IngressOutcome, BridgeError> {
        let mut phase = Phase::Idle;
        let mut staged: Vec<AudioFrame> = Vec::new();
        let mut coalesce_sleep: Option<Pin<Box<Sleep>>> = None;
        let mut ack_sleep: Option<Pin<Box<Sleep>>> = None;

        let silence_sleep = sleep(self.silence_timeout());
        tokio::pin!(silence_sleep);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return Ok(IngressOutcome::Cancelled),

                () = &mut silence_sleep, if matches!(phase, Phase::Open) => {
                    self.close_turn(&mut phase, &mut staged, &mut coalesce_sleep).await?;
                }

                () = Self::await_deadline(&mut coalesce_sleep), if coalesce_sleep.is_some() => {
                    self.flush_staged(&mut staged).await?;
                    coalesce_sleep = None;
                }

                () = Self::await_deadline(&mut ack_sleep), if ack_sleep.is_some() => {
                    return Err(BridgeError::Timeout(format!(
                        "model did not ack prompt start within {}ms for {}",
                        self.ack_timeout_ms, self.call_id
                    )));
                }

                signal = self.turn_signals.recv() => {
                    match signal {
                        Some(TurnSignal::PromptAcked) => {
                            ack_sleep = None;
                            if let Phase::AwaitingAck { pending } =
                                std::mem::replace(&mut phase, Phase::Open)
                            {
                                self.open_content_blocks(pending, &mut staged, &mut coalesce_sleep)
                                    .await?;
                            }
                            silence_sleep.as_mut().reset(Instant::now() + self.silence_timeout());
                        }
                        Some(TurnSignal::TurnEndedByModel) => {
                            ack_sleep = None;
                            phase = Phase::Idle;
                        }
                        None => {}
                    }
                }

                event = self.receiver.recv() => {
                    let Some(event) = event else {
                        return Ok(IngressOutcome::TransportClosed);
                    };
                    let event = event?;
                    match event {
                        TelephonyInboundEvent::Connected => {}
                        TelephonyInboundEvent::Start(_) => {
                            return Err(BridgeError::ProtocolViolation(
                                "unexpected start on an already-open session".into(),
                            ));
                        }
                        TelephonyInboundEvent::Media { payload } => {
                            let raw = AudioFrame::new(AudioEncoding::Mulaw8k, payload);
                            let frame = mulaw8k_to_pcm16_16k(&raw)
                                .map_err(|e| BridgeError::ProtocolViolation(e.to_string()))?;

                            if matches!(phase, Phase::Idle) {
                                self.open_turn(&mut phase, &mut ack_sleep).await?;
                            }
                            silence_sleep
                                .as_mut()
                                .reset(Instant::now() + self.silence_timeout());

                            match &mut phase {
                                Phase::AwaitingAck { pending } => pending.push(frame),
                                Phase::Open => {
                                    self.forward(frame, &mut staged, &mut coalesce_sleep).await?;
                                }
                                Phase::Idle => unreachable!(
                                    "open_turn always transitions out of Idle"
                                ),
                            }
                        }
                        TelephonyInboundEvent::Stop => {
                            if matches!(phase, Phase::Open) {
                                self.close_turn(&mut phase, &mut staged, &mut coalesce_sleep)
                                    .await?;
                            }
                            return Ok(IngressOutcome::Stopped);
                        }
                        TelephonyInboundEvent::Mark { .. } | TelephonyInboundEvent::Dtmf { .. } => {}
                    }
                }
            }
        }
    }

    async fn await_deadline(sleep: &mut Option<Pin<Box<Sleep>>>) {
        match sleep {
            Some(sleep) => sleep.as_mut().await,
            None => std::future::pending().await,
        }
    }

    fn silence_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.turn.silence_timeout_ms))
    }

    fn ack_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.ack_timeout_ms))
    }

    /// Opens a new user turn: sends `PromptStart` and buffers any audio
    /// that arrives before the model's `Ack` so nothing is forwarded while
    /// the outbound grammar is still in `AwaitingPromptAck`. Arms
    /// `ack_sleep` so the turn fails with `BridgeError::Timeout` if the ack
    /// never arrives.
    async fn open_turn(
        &self,
        phase: &mut Phase,
        ack_sleep: &mut Option<Pin<Box<Sleep>>>,
    ) -> Result<(), BridgeError> {
        self.requests
            .send_control(ModelRequestEvent::PromptStart {
                call_id: self.call_id.clone(),
            })
            .await?;
        self.emitter.emit(BridgeEvent::TurnStarted {
            call_id: self.call_id.clone(),
        });
        *phase = Phase::AwaitingAck { pending: Vec::new() };
        *ack_sleep = Some(Box::pin(sleep(self.ack_timeout())));
        Ok(())
    }

    /// Sends the mandatory system/text content block for this prompt, then
    /// opens the user/audio content block the rest of the turn's audio
    /// lands in, forwarding whatever arrived while awaiting the ack.
    async fn open_content_blocks(
        &self,
        pending: Vec<AudioFrame>,
        staged: &mut Vec<AudioFrame>,
        coalesce_sleep: &mut Option<Pin<Box<Sleep>>>,
    ) -> Result<(), BridgeError> {
        self.requests
            .send_control(ModelRequestEvent::ContentStart {
                call_id: self.call_id.clone(),
                role: ContentRole::System,
                kind: ContentKind::Text,
            })
            .await?;
        self.requests
            .send_control(ModelRequestEvent::TextInput {
                call_id: self.call_id.clone(),
                text: self.system_prompt.clone(),
            })
            .await?;
        self.requests
            .send_control(ModelRequestEvent::ContentEnd {
                call_id: self.call_id.clone(),
            })
            .await?;

        self.requests
            .send_control(ModelRequestEvent::ContentStart {
                call_id: self.call_id.clone(),
                role: ContentRole::User,
                kind: ContentKind::Audio,
            })
            .await?;

        for frame in pending {
            self.forward(frame, staged, coalesce_sleep).await?;
        }
        Ok(())
    }

    /// Closes the open user turn: drains any staged (coalesced) audio,
    /// closes the audio content block, waits the configured gap to let the
    /// model drain any pending audio context, then closes the prompt.
    async fn close_turn(
        &self,
        phase: &mut Phase,
        staged: &mut Vec<AudioFrame>,
        coalesce_sleep: &mut Option<Pin<Box<Sleep>>>,
    ) -> Result<(), BridgeError> {
        self.flush_staged(staged).await?;
        *coalesce_sleep = None;
        self.requests
            .send_control(ModelRequestEvent::ContentEnd {
                call_id: self.call_id.clone(),
            })
            .await?;
        tokio::time::sleep(Duration::from_millis(u64::from(self.turn.end_gap_ms))).await;
        self.requests
            .send_control(ModelRequestEvent::PromptEnd {
                call_id: self.call_id.clone(),
            })
            .await?;
        self.emitter.emit(BridgeEvent::TurnEnded {
            call_id: self.call_id.clone(),
        });
        *phase = Phase::Idle;
        Ok(())
    }

    /// Route one already-transcoded frame through the configured
    /// forwarding policy.
    async fn forward(
        &self,
        frame: AudioFrame,
        staged: &mut Vec<AudioFrame>,
        coalesce_sleep: &mut Option<Pin<Box<Sleep>>>,
    ) -> Result<(), BridgeError> {
        match self.input.forwarding_mode {
            ForwardingMode::Immediate => {
                self.requests
                    .send_audio(ModelRequestEvent::AudioInput {
                        call_id: self.call_id.clone(),
                        frame,
                    })
                    .await
            }
            ForwardingMode::Coalesced => {
                if staged.is_empty() {
                    *coalesce_sleep = Some(Box::pin(sleep(Duration::from_millis(u64::from(
                        self.input.coalesce_max_wait_ms,
                    )))));
                }
                staged.push(frame);
                if staged.len() >= self.input.coalesce_max_chunks as usize {
                    *coalesce_sleep = None;
                    self.flush_staged(staged).await?;
                }
                Ok(())
            }
        }
    }

    /// Send every staged frame as one `AudioInput` event each, in arrival
    /// order, then clear the staging buffer.
    async fn flush_staged(&self, staged: &mut Vec<AudioFrame>) -> Result<(), BridgeError> {
        for frame in staged.drain(..) {
            self.requests
                .send_audio(ModelRequestEvent::AudioInput {
                    call_id: self.call_id.clone(),
                    frame,
                })
                .await?;
        }
        Ok(())
    }
}
