//! Event emitter trait for cross-crate event broadcasting.
//!
//! This module defines the abstraction for emitting bridge events.
//! Implementations handle transport details (channels, metrics sinks, etc.).

use crate::events::BridgeEvent;

/// Trait for emitting bridge events.
///
/// This abstraction keeps event plumbing consistent across crates and
/// prevents channel types from becoming part of the public API surface.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and contexts that don't need events
/// - Adapter-specific implementations (tracing sink, metrics exporter, etc.)
pub trait AppEventEmitter: Send + Sync {
    /// Emit a bridge event.
    ///
    /// Implementations should handle the event asynchronously or buffer it.
    /// This method should not block.
    fn emit(&self, event: BridgeEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn AppEventEmitter>;
}

/// A no-op event emitter for tests and contexts without a listener.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AppEventEmitter for NoopEmitter {
    fn emit(&self, _event: BridgeEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn AppEventEmitter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CallId;
    use std::sync::Arc;

    #[test]
    fn noop_emitter_does_not_panic() {
        let emitter = NoopEmitter::new();
        emitter.emit(BridgeEvent::SessionEnded {
            call_id: CallId::new("CA1"),
            reason: "normal".into(),
        });
    }

    #[test]
    fn noop_emitter_clone_box() {
        let emitter = NoopEmitter::new();
        let _boxed: Box<dyn AppEventEmitter> = emitter.clone_box();
    }

    #[test]
    fn arc_emitter_is_object_safe() {
        let emitter: Arc<dyn AppEventEmitter> = Arc::new(NoopEmitter::new());
        emitter.emit(BridgeEvent::SessionEnded {
            call_id: CallId::new("CA1"),
            reason: "normal".into(),
        });
    }
}
