//! `AppEventEmitter` backed by `tracing`.
//!
//! This binary has no dashboard or SSE listener to forward bridge events
//! to, so the only sink it needs is structured log output — one
//! `tracing::info!` per event, carrying `call_id` and `event` as fields so
//! an operator's log aggregator can filter and alert on them.

use voicebridge_core::{AppEventEmitter, BridgeEvent};

#[derive(Debug, Clone, Default)]
pub struct TracingEventEmitter;

impl TracingEventEmitter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AppEventEmitter for TracingEventEmitter {
    fn emit(&self, event: BridgeEvent) {
        let call_id = event.call_id().clone();
        let name = event.event_name();
        match &event {
            BridgeEvent::ToolFailed { error, .. } => {
                tracing::warn!(%call_id, event = name, error, "bridge event");
            }
            BridgeEvent::ModelStreamError { detail, .. } => {
                tracing::warn!(%call_id, event = name, detail, "bridge event");
            }
            BridgeEvent::OutputBufferOverflow { dropped_frames, .. } => {
                tracing::warn!(%call_id, event = name, dropped_frames, "bridge event");
            }
            _ => {
                tracing::info!(%call_id, event = name, "bridge event");
            }
        }
    }

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicebridge_core::CallId;

    #[test]
    fn emit_does_not_panic_for_any_variant() {
        let emitter = TracingEventEmitter::new();
        emitter.emit(BridgeEvent::SessionStarted {
            call_id: CallId::new("CA1"),
        });
        emitter.emit(BridgeEvent::ToolFailed {
            call_id: CallId::new("CA1"),
            tool_name: "search".into(),
            error: "timed out".into(),
        });
    }
}
