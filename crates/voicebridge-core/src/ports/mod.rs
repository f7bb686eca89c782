//! Port definitions (trait abstractions) for external collaborators.
//!
//! Ports define the interfaces the bridge expects from infrastructure and
//! from external systems. They contain no implementation details and use
//! only domain types.
//!
//! # Design Rules
//!
//! - No HTTP client types or WebSocket types in any signature
//! - Traits are minimal and intent-based, not implementation-leaking

mod errors;
mod event_emitter;
mod knowledge;
mod transport;

pub use errors::BridgeError;
pub use event_emitter::{AppEventEmitter, NoopEmitter};
pub use knowledge::{KnowledgeError, KnowledgeServicePort, ToolDirectoryPort};
pub use transport::{TelephonyReceiver, TelephonySender};
