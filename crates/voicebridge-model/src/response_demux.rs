//! Inbound half of the model stream: turns raw HTTP/2 response bytes into
//! typed `ModelResponseEvent`s and dispatches each to the right mailbox
//! without ever blocking on a slow handler.
//!
//! Shaped the same way as an SSE-to-NDJSON adapter: buffer bytes until a
//! full line is available, parse it, hand it off, repeat. The difference
//! here is the wire format is already newline-delimited JSON in both
//! directions, so there is no format translation, only framing and typed
//! dispatch.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use tokio::sync::{Mutex, mpsc};

use voicebridge_core::{BridgeError, CallId, ModelResponseEvent};

use crate::grammar::Grammar;
use crate::wire::InboundFrame;

/// Per-event-kind mailboxes a response demuxer dispatches into.
///
/// Splitting by kind means `SessionCoordinator`'s audio-output reader and
/// its tool-use reader can each `.recv().await` independently; neither
/// waits behind the other's handler logic.
pub struct ResponseMailboxes {
    pub audio_and_text: mpsc::Sender<ModelResponseEvent>,
    pub tool_use: mpsc::Sender<ModelResponseEvent>,
    pub control: mpsc::Sender<ModelResponseEvent>,
}

fn find_newline(buf: &BytesMut) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n').map(|pos| pos + 1)
}

/// Drain `byte_stream`, buffering partial lines, dispatching one
/// `ModelResponseEvent` per complete line read. Returns (and logs) on the
/// first grammar violation or stream error; callers treat that as the
/// model stream closing.
pub async fn run_demuxer<S>(
    call_id: CallId,
    mut byte_stream: S,
    grammar: Arc<Mutex<Grammar>>,
    mailboxes: ResponseMailboxes,
) where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Unpin,
{
    let mut buf = BytesMut::new();

    loop {
        while let Some(line_end) = find_newline(&buf) {
            let line = buf.split_to(line_end);
            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }

            match dispatch_line(trimmed, &call_id, &grammar, &mailboxes).await {
                Ok(()) => {}
                Err(error) => {
                    tracing::warn!(call_id = %call_id, %error, "model response demuxer stopping");
                    return;
                }
            }
        }

        match byte_stream.next().await {
            Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
            Some(Err(error)) => {
                tracing::warn!(call_id = %call_id, %error, "model stream transport error");
                return;
            }
            None => return,
        }
    }
}

async fn dispatch_line(
    line: &[u8],
    call_id: &CallId,
    grammar: &Arc<Mutex<Grammar>>,
    mailboxes: &ResponseMailboxes,
) -> Result<(), BridgeError> {
    let frame: InboundFrame = serde_json::from_slice(line)
        .map_err(|e| BridgeError::ProtocolViolation(format!("malformed model frame: {e}")))?;
    let event = frame
        .into_domain()
        .map_err(|e| BridgeError::ProtocolViolation(e.to_string()))?;

    if event.call_id() != call_id {
        return Err(BridgeError::ProtocolViolation(format!(
            "event for call {} arrived on {call_id}'s stream",
            event.call_id()
        )));
    }

    grammar.lock().await.validate_inbound(&event)?;

    let sender = match &event {
        ModelResponseEvent::AudioOutput { .. } | ModelResponseEvent::TextOutput { .. } => {
            &mailboxes.audio_and_text
        }
        ModelResponseEvent::ToolUse { .. } => &mailboxes.tool_use,
        ModelResponseEvent::Ack { .. }
        | ModelResponseEvent::Stopped { .. }
        | ModelResponseEvent::Error { .. } => &mailboxes.control,
    };

    sender
        .send(event)
        .await
        .map_err(|_| BridgeError::ResourceExhaustion("response mailbox closed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn mailboxes() -> (
        ResponseMailboxes,
        mpsc::Receiver<ModelResponseEvent>,
        mpsc::Receiver<ModelResponseEvent>,
        mpsc::Receiver<ModelResponseEvent>,
    ) {
        let (audio_tx, audio_rx) = mpsc::channel(8);
        let (tool_tx, tool_rx) = mpsc::channel(8);
        let (control_tx, control_rx) = mpsc::channel(8);
        (
            ResponseMailboxes {
                audio_and_text: audio_tx,
                tool_use: tool_tx,
                control: control_tx,
            },
            audio_rx,
            tool_rx,
            control_rx,
        )
    }

    #[tokio::test]
    async fn routes_ack_to_control_mailbox() {
        let call_id = CallId::new("CA1");
        let grammar = Arc::new(Mutex::new(Grammar::new()));
        grammar
            .lock()
            .await
            .validate_outbound(&voicebridge_core::ModelRequestEvent::SessionStart {
                call_id: call_id.clone(),
                tools: Vec::new(),
            })
            .unwrap();
        grammar
            .lock()
            .await
            .validate_outbound(&voicebridge_core::ModelRequestEvent::PromptStart {
                call_id: call_id.clone(),
            })
            .unwrap();

        let line = format!("{{\"event\":\"ack\",\"callId\":\"{call_id}\"}}\n");
        let byte_stream = stream::iter(vec![Ok::<_, reqwest::Error>(Bytes::from(line))]);

        let (mailboxes, _audio_rx, _tool_rx, mut control_rx) = mailboxes();
        run_demuxer(call_id, byte_stream, grammar, mailboxes).await;

        let event = control_rx.recv().await.unwrap();
        assert!(matches!(event, ModelResponseEvent::Ack { .. }));
    }

    #[tokio::test]
    async fn event_for_a_different_call_id_is_rejected() {
        let call_id = CallId::new("CA1");
        let grammar = Arc::new(Mutex::new(Grammar::new()));

        let line = "{\"event\":\"ack\",\"callId\":\"CA-other\"}\n";
        let byte_stream = stream::iter(vec![Ok::<_, reqwest::Error>(Bytes::from(line))]);

        let (mailboxes, _audio_rx, _tool_rx, mut control_rx) = mailboxes();
        run_demuxer(call_id, byte_stream, grammar, mailboxes).await;

        assert!(control_rx.try_recv().is_err());
    }
}
