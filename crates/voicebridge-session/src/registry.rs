//! Process-wide map of call identifier to session handle.
//!
//! The registry is the one piece of state shared across calls. Everything
//! else a session owns lives behind its own `SessionCoordinator`; the
//! registry only ever sees a `CallId` and a handle used for lookup and
//! shutdown dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use voicebridge_core::{BridgeError, CallId};

/// A non-owning reference to a running session, held by the registry.
///
/// Cloning a handle is cheap (an `Arc`-backed cancellation token); the
/// registry and anything else that needs to reach a session do so through
/// clones of this handle rather than through the `SessionCoordinator`
/// itself, which is owned solely by the task driving that call.
#[derive(Clone)]
pub struct SessionHandle {
    call_id: CallId,
    cancel: CancellationToken,
}

impl SessionHandle {
    #[must_use]
    pub fn new(call_id: CallId, cancel: CancellationToken) -> Self {
        Self { call_id, cancel }
    }

    #[must_use]
    pub const fn call_id(&self) -> &CallId {
        &self.call_id
    }

    /// Trip this session's cancellation token. Idempotent.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// Process-wide registry of in-progress calls.
///
/// All operations are linearizable with respect to each other: the whole
/// registry is guarded by a single mutex, held only across the map lookup
/// itself, never across a suspension point.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<CallId, SessionHandle>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new call. Fails if `call_id` is already registered —
    /// callers must reject the duplicate `start` handshake rather than
    /// silently replace the existing session.
    pub async fn register(&self, handle: SessionHandle) -> Result<(), BridgeError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(handle.call_id()) {
            return Err(BridgeError::ProtocolViolation(format!(
                "call {} is already registered",
                handle.call_id()
            )));
        }
        sessions.insert(handle.call_id().clone(), handle);
        Ok(())
    }

    pub async fn lookup(&self, call_id: &CallId) -> Option<SessionHandle> {
        self.sessions.lock().await.get(call_id).cloned()
    }

    pub async fn unregister(&self, call_id: &CallId) -> Option<SessionHandle> {
        self.sessions.lock().await.remove(call_id)
    }

    /// Trip every session's cancellation token and drop them from the map.
    /// Does not wait for the sessions' tasks to finish unwinding.
    pub async fn shutdown_all(&self) {
        let mut sessions = self.sessions.lock().await;
        for handle in sessions.values() {
            handle.shutdown();
        }
        sessions.clear();
    }

    #[must_use]
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    #[must_use]
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registering_the_same_call_twice_is_rejected() {
        let registry = SessionRegistry::new();
        let handle = SessionHandle::new(CallId::new("CA1"), CancellationToken::new());
        registry.register(handle.clone()).await.unwrap();

        let result = registry.register(handle).await;
        assert!(matches!(result, Err(BridgeError::ProtocolViolation(_))));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn lookup_returns_none_for_unknown_call() {
        let registry = SessionRegistry::new();
        assert!(registry.lookup(&CallId::new("CA-missing")).await.is_none());
    }

    #[tokio::test]
    async fn unregister_removes_the_entry() {
        let registry = SessionRegistry::new();
        let call_id = CallId::new("CA1");
        registry
            .register(SessionHandle::new(call_id.clone(), CancellationToken::new()))
            .await
            .unwrap();

        let removed = registry.unregister(&call_id).await;
        assert!(removed.is_some());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn shutdown_all_trips_every_token_and_empties_the_map() {
        let registry = SessionRegistry::new();
        let token_a = CancellationToken::new();
        let token_b = CancellationToken::new();
        registry
            .register(SessionHandle::new(CallId::new("CA1"), token_a.clone()))
            .await
            .unwrap();
        registry
            .register(SessionHandle::new(CallId::new("CA2"), token_b.clone()))
            .await
            .unwrap();

        registry.shutdown_all().await;

        assert!(token_a.is_cancelled());
        assert!(token_b.is_cancelled());
        assert!(registry.is_empty().await);
    }
}
