//! Single-writer outbound serializer for a call's model stream.
//!
//! The model stream is a single HTTP/2 request body; only one task may
//! write to it. `RequestStream` is the one place that serializes
//! `ModelRequestEvent`s to wire bytes, fed by two lanes so a burst of
//! audio chunks can never delay a `ToolResult` or `SessionEnd` sitting
//! behind it.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{Mutex, mpsc};

use voicebridge_core::{BridgeError, ModelRequestEvent};

use crate::grammar::Grammar;
use crate::wire::OutboundFrame;

/// How many unsent audio chunks may queue before `send_audio` applies
/// backpressure to its caller. Control events (tool results, prompt
/// boundaries) use a small fixed-capacity lane of their own so they are
/// never starved behind a queue of audio.
const AUDIO_LANE_CAPACITY: usize = 32;
const PRIORITY_LANE_CAPACITY: usize = 8;

pub struct RequestStream {
    grammar: Arc<Mutex<Grammar>>,
    priority_tx: mpsc::Sender<ModelRequestEvent>,
    audio_tx: mpsc::Sender<ModelRequestEvent>,
}

impl RequestStream {
    /// `grammar` is shared with the response demuxer for this same call:
    /// outbound and inbound events interleave against one state machine,
    /// not two independent ones.
    #[must_use]
    pub fn new(
        grammar: Arc<Mutex<Grammar>>,
    ) -> (
        Self,
        mpsc::Receiver<ModelRequestEvent>,
        mpsc::Receiver<ModelRequestEvent>,
    ) {
        let (priority_tx, priority_rx) = mpsc::channel(PRIORITY_LANE_CAPACITY);
        let (audio_tx, audio_rx) = mpsc::channel(AUDIO_LANE_CAPACITY);
        (
            Self {
                grammar,
                priority_tx,
                audio_tx,
            },
            priority_rx,
            audio_rx,
        )
    }

    /// Session/turn boundaries and tool results: always sent on the
    /// priority lane.
    pub async fn send_control(&self, event: ModelRequestEvent) -> Result<(), BridgeError> {
        self.grammar.lock().await.validate_outbound(&event)?;
        self.priority_tx
            .send(event)
            .await
            .map_err(|_| BridgeError::ResourceExhaustion("model request stream closed".into()))
    }

    /// Telephony audio: sent on the bulk lane, which backpressures once
    /// `AUDIO_LANE_CAPACITY` chunks are outstanding.
    pub async fn send_audio(&self, event: ModelRequestEvent) -> Result<(), BridgeError> {
        self.grammar.lock().await.validate_outbound(&event)?;
        self.audio_tx
            .send(event)
            .await
            .map_err(|_| BridgeError::ResourceExhaustion("model request stream closed".into()))
    }
}

/// Drains both lanes, biased toward the priority lane, serializing each
/// event as one newline-terminated JSON frame onto `body_tx`. Returns when
/// both lanes are closed.
pub async fn run_writer(
    mut priority_rx: mpsc::Receiver<ModelRequestEvent>,
    mut audio_rx: mpsc::Receiver<ModelRequestEvent>,
    body_tx: mpsc::Sender<Bytes>,
) {
    loop {
        let event = tokio::select! {
            biased;
            control = priority_rx.recv() => control,
            audio = audio_rx.recv() => audio,
        };

        let Some(event) = event else {
            if priority_rx.is_closed() && audio_rx.is_closed() {
                return;
            }
            continue;
        };

        let frame = OutboundFrame::from(&event);
        let Ok(mut line) = serde_json::to_vec(&frame) else {
            tracing::error!("failed to serialize outbound model frame, dropping");
            continue;
        };
        line.push(b'\n');

        if body_tx.send(Bytes::from(line)).await.is_err() {
            tracing::warn!("model HTTP/2 body sender closed, stopping writer");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicebridge_core::CallId;

    #[tokio::test]
    async fn priority_lane_is_drained_before_audio_lane() {
        let (stream, priority_rx, audio_rx) = RequestStream::new(Arc::new(Mutex::new(Grammar::new())));
        stream
            .send_control(ModelRequestEvent::SessionStart {
                call_id: CallId::new("CA1"),
                tools: Vec::new(),
            })
            .await
            .unwrap();

        let (body_tx, mut body_rx) = mpsc::channel(8);
        tokio::spawn(run_writer(priority_rx, audio_rx, body_tx));

        let first = body_rx.recv().await.unwrap();
        assert!(String::from_utf8_lossy(&first).contains("sessionStart"));
    }

    #[tokio::test]
    async fn grammar_violation_is_rejected_before_touching_the_lane() {
        let (stream, _priority_rx, _audio_rx) =
            RequestStream::new(Arc::new(Mutex::new(Grammar::new())));
        let result = stream
            .send_control(ModelRequestEvent::PromptEnd {
                call_id: CallId::new("CA1"),
            })
            .await;
        assert!(matches!(result, Err(BridgeError::GrammarViolation(_))));
    }
}
