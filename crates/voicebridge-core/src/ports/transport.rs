use async_trait::async_trait;

use crate::domain::{CloseCode, TelephonyInboundEvent, TelephonyOutboundEvent};
use crate::ports::errors::BridgeError;

/// Read half of the telephony transport.
///
/// Owned by exactly one task — the session's ingress reader — for the
/// life of a session; never shared, so `recv` takes `&mut self`.
#[async_trait]
pub trait TelephonyReceiver: Send {
    /// Returns `None` once the peer has closed the connection.
    async fn recv(&mut self) -> Option<Result<TelephonyInboundEvent, BridgeError>>;
}

/// Write half of the telephony transport.
///
/// Shared between `OutputPacer` and the session's lifecycle driver, so
/// implementations must tolerate concurrent `send`/`close` calls (e.g. by
/// wrapping an internal channel to the actual socket writer task).
#[async_trait]
pub trait TelephonySender: Send + Sync {
    async fn send(&self, event: TelephonyOutboundEvent) -> Result<(), BridgeError>;

    /// Close the connection with the given code. Idempotent.
    async fn close(&self, code: CloseCode, reason: &str);
}
