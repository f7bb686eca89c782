//! `GET /stream` — WebSocket upgrade endpoint for the telephony media
//! stream.
//!
//! Grounded on this workspace's own audio-data-plane WebSocket handler:
//! the connection is accepted with no session yet in existence, split
//! into sender/receiver halves, and only promoted to a registered,
//! running session once the telephony peer's `start` handshake has been
//! read off the wire. Everything before that point — `connected`
//! advisories, handshake validation — happens here; everything after is
//! `SessionCoordinator`'s job.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use voicebridge_core::{
    BridgeError, CallId, CloseCode, TelephonyInboundEvent, TelephonyReceiver, TelephonySender,
};
use voicebridge_session::{SessionCoordinator, SessionDeps, SessionHandle};

use crate::state::AppState;
use crate::ws_transport::{WsTelephonyReceiver, WsTelephonySender};

pub async fn stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_stream(socket, state))
}

async fn handle_stream(socket: WebSocket, state: AppState) {
    let (sink, ws_stream) = socket.split();
    let sender: Arc<dyn TelephonySender> = Arc::new(WsTelephonySender::spawn(sink));
    let mut receiver = WsTelephonyReceiver::new(ws_stream);

    let (call_id, stream_sid) = match await_start(&mut receiver).await {
        Ok(params) => params,
        Err(Some((code, reason))) => {
            sender.close(code, &reason).await;
            return;
        }
        Err(None) => return, // peer disconnected before completing the handshake
    };

    let cancel = CancellationToken::new();
    if let Err(error) = state
        .registry
        .register(SessionHandle::new(call_id.clone(), cancel.clone()))
        .await
    {
        tracing::warn!(%call_id, %error, "rejecting duplicate call");
        sender
            .close(CloseCode::PolicyViolation, "call already in progress")
            .await;
        return;
    }

    let deps = SessionDeps {
        call_id,
        stream_sid,
        telephony_rx: Box::new(receiver),
        telephony_tx: sender,
        model: Arc::clone(&state.model),
        knowledge: Arc::clone(&state.knowledge),
        directory: Arc::clone(&state.directory),
        registry: Arc::clone(&state.registry),
        config: state.config.clone(),
        emitter: Arc::clone(&state.emitter),
        cancel,
    };

    SessionCoordinator::new(deps).run().await;
}

/// Read telephony control messages until the `start` handshake arrives.
/// `connected` is advisory and skipped; anything else (media before a
/// session exists, a second `start`, a malformed frame) fails the
/// handshake. `Ok` carries the telephony-assigned call id and stream sid;
/// `Err(Some(..))` carries the close code/reason to send before hanging
/// up; `Err(None)` means the peer was already gone.
async fn await_start(
    receiver: &mut dyn TelephonyReceiver,
) -> Result<(CallId, String), Option<(CloseCode, String)>> {
    loop {
        match receiver.recv().await {
            Some(Ok(TelephonyInboundEvent::Connected)) => {}
            Some(Ok(TelephonyInboundEvent::Start(params))) => {
                if let Some(rate) = params.sample_rate_hz {
                    if rate != 8_000 {
                        tracing::warn!(
                            call_sid = %params.call_sid,
                            advertised_rate = rate,
                            "telephony peer advertised a non-8kHz sample rate; ignoring"
                        );
                    }
                }
                return Ok((CallId::new(params.call_sid), params.stream_sid));
            }
            Some(Ok(_other)) => {
                return Err(Some((
                    CloseCode::PolicyViolation,
                    "expected start handshake".into(),
                )));
            }
            Some(Err(error)) => return Err(Some(handshake_close(&error))),
            None => return Err(None),
        }
    }
}

/// Classify a handshake-phase `BridgeError` into the telephony close code
/// the peer sees. A structurally invalid frame (bad JSON) is 1003; a
/// frame that parses but fails the handshake's own expectations (missing
/// call id, wrong event) is 1008, per the telephony interface's close
/// code table.
fn handshake_close(error: &BridgeError) -> (CloseCode, String) {
    match error {
        BridgeError::ProtocolViolation(detail) => {
            let code = if detail.starts_with("invalid JSON control message") {
                CloseCode::InvalidMessage
            } else {
                CloseCode::PolicyViolation
            };
            (code, detail.clone())
        }
        other => (CloseCode::Internal, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use voicebridge_core::StartParams;

    struct ScriptedReceiver {
        events: std::vec::IntoIter<Option<Result<TelephonyInboundEvent, BridgeError>>>,
    }

    impl ScriptedReceiver {
        fn new(events: Vec<Option<Result<TelephonyInboundEvent, BridgeError>>>) -> Self {
            Self {
                events: events.into_iter(),
            }
        }
    }

    #[async_trait]
    impl voicebridge_core::TelephonyReceiver for ScriptedReceiver {
        async fn recv(&mut self) -> Option<Result<TelephonyInboundEvent, BridgeError>> {
            self.events.next().flatten()
        }
    }

    #[test]
    fn missing_call_id_closes_with_policy_violation() {
        let error = BridgeError::ProtocolViolation("start handshake missing a call identifier".into());
        let (code, _) = handshake_close(&error);
        assert_eq!(code, CloseCode::PolicyViolation);
    }

    #[test]
    fn malformed_json_closes_with_invalid_message() {
        let error = BridgeError::ProtocolViolation("invalid JSON control message: EOF".into());
        let (code, _) = handshake_close(&error);
        assert_eq!(code, CloseCode::InvalidMessage);
    }

    #[tokio::test]
    async fn connected_is_skipped_and_start_yields_the_call_id() {
        let mut receiver = ScriptedReceiver::new(vec![
            Some(Ok(TelephonyInboundEvent::Connected)),
            Some(Ok(TelephonyInboundEvent::Start(StartParams {
                stream_sid: "MZ1".into(),
                call_sid: "CA1".into(),
                sample_rate_hz: Some(8_000),
            }))),
        ]);

        let (call_id, stream_sid) = await_start(&mut receiver).await.unwrap();
        assert_eq!(call_id.as_str(), "CA1");
        assert_eq!(stream_sid, "MZ1");
    }

    #[tokio::test]
    async fn media_before_start_fails_the_handshake() {
        let mut receiver = ScriptedReceiver::new(vec![Some(Ok(TelephonyInboundEvent::Media {
            payload: vec![0, 1, 2],
        }))]);

        let outcome = await_start(&mut receiver).await;
        assert!(matches!(
            outcome,
            Err(Some((CloseCode::PolicyViolation, _)))
        ));
    }

    #[tokio::test]
    async fn peer_disconnect_before_start_yields_no_close_frame() {
        let mut receiver = ScriptedReceiver::new(vec![None]);
        let outcome = await_start(&mut receiver).await;
        assert!(matches!(outcome, Err(None)));
    }
}
