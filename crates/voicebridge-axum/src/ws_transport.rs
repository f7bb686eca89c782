//! `TelephonyReceiver`/`TelephonySender` over a real `axum` WebSocket.
//!
//! Grounded on this workspace's own audio-data-plane WebSocket handler: the
//! socket is split once into a sender half and a receiver half, and each
//! half is handed to exactly one task for the life of the session — the
//! receiver to `InputFlow`'s ingress loop, the sender (behind an `Arc`, to
//! satisfy `TelephonySender: Sync`) shared between `OutputPacer`'s egress
//! writer and the lifecycle close path.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc};

use voicebridge_core::{BridgeError, CloseCode, TelephonyInboundEvent, TelephonyOutboundEvent};

use crate::wire::{InboundFrame, OutboundFrame};

/// Read half. Owned solely by `InputFlow`'s ingress task.
pub struct WsTelephonyReceiver {
    inner: SplitStream<WebSocket>,
}

impl WsTelephonyReceiver {
    #[must_use]
    pub fn new(inner: SplitStream<WebSocket>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl voicebridge_core::TelephonyReceiver for WsTelephonyReceiver {
    async fn recv(&mut self) -> Option<Result<TelephonyInboundEvent, BridgeError>> {
        loop {
            let message = match self.inner.next().await? {
                Ok(message) => message,
                Err(error) => {
                    return Some(Err(BridgeError::TransientTransport(error.to_string())));
                }
            };
            match message {
                Message::Text(text) => {
                    return Some(
                        InboundFrame::parse(&text)
                            .and_then(InboundFrame::into_domain)
                            .map_err(|error| BridgeError::ProtocolViolation(error.to_string())),
                    );
                }
                Message::Close(_) => return None,
                // Ping/Pong/Binary are not part of the telephony control
                // protocol (media travels base64-encoded inside text
                // frames, per the telephony interface); ignore and keep
                // reading rather than treat them as a violation.
                Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
            }
        }
    }
}

/// Write half. A single background task owns the actual `SplitSink` and
/// drains a channel, so the `Arc`-shared `send`/`close` calls required by
/// `TelephonySender` never need their own lock around socket I/O.
pub struct WsTelephonySender {
    tx: mpsc::Sender<WsCommand>,
    /// Guards against sending after `close` has already gone out — the
    /// writer task exits once it observes a `Close`, so a `send` racing
    /// behind it would otherwise sit in the channel forever.
    closed: Mutex<bool>,
}

enum WsCommand {
    Frame(OutboundFrame),
    Close(u16, String),
}

impl WsTelephonySender {
    /// Spawns the writer task over `sink` and returns a sender bound to it.
    pub fn spawn(sink: futures_util::stream::SplitSink<WebSocket, Message>) -> Self {
        let (tx, mut rx) = mpsc::channel::<WsCommand>(64);
        tokio::spawn(async move {
            let mut sink = sink;
            while let Some(command) = rx.recv().await {
                match command {
                    WsCommand::Frame(frame) => {
                        let Ok(json) = serde_json::to_string(&frame) else {
                            tracing::warn!("failed to serialize outbound telephony frame");
                            continue;
                        };
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    WsCommand::Close(code, reason) => {
                        let _ = sink
                            .send(Message::Close(Some(axum::extract::ws::CloseFrame {
                                code,
                                reason: reason.into(),
                            })))
                            .await;
                        break;
                    }
                }
            }
        });
        Self {
            tx,
            closed: Mutex::new(false),
        }
    }
}

#[async_trait]
impl voicebridge_core::TelephonySender for WsTelephonySender {
    async fn send(&self, event: TelephonyOutboundEvent) -> Result<(), BridgeError> {
        if *self.closed.lock().await {
            return Ok(());
        }
        let frame = OutboundFrame::from(&event);
        self.tx
            .send(WsCommand::Frame(frame))
            .await
            .map_err(|_| BridgeError::TransientTransport("telephony socket closed".into()))
    }

    async fn close(&self, code: CloseCode, reason: &str) {
        let mut closed = self.closed.lock().await;
        if *closed {
            return;
        }
        *closed = true;
        let _ = self
            .tx
            .send(WsCommand::Close(code.code(), reason.to_string()))
            .await;
    }
}
