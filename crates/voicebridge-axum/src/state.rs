//! Shared application state type.
//!
//! Mirrors this workspace's convention elsewhere of a single
//! `Arc`-wrapped context struct threaded through every handler via axum's
//! `State` extractor, rather than a grab-bag of individually-injected
//! dependencies.

use std::sync::Arc;

use voicebridge_core::{AppEventEmitter, BridgeConfig, KnowledgeServicePort, ToolDirectoryPort};
use voicebridge_model::ModelDriver;
use voicebridge_session::SessionRegistry;

/// Everything a telephony WebSocket connection needs in order to become a
/// running session: the process-wide registry it registers into, the
/// model driver it opens a call against, the tool/knowledge collaborators
/// `SessionCoordinator` wires into `ToolRunner`, the resolved bridge
/// configuration, and the event sink for observability.
pub struct BridgeContext {
    pub registry: Arc<SessionRegistry>,
    pub model: Arc<ModelDriver>,
    pub knowledge: Arc<dyn KnowledgeServicePort>,
    pub directory: Arc<dyn ToolDirectoryPort>,
    pub config: BridgeConfig,
    pub emitter: Arc<dyn AppEventEmitter>,
}

/// Application state shared across all handlers. An `Arc<BridgeContext>`
/// so cloning it into a spawned session task is cheap.
pub type AppState = Arc<BridgeContext>;
