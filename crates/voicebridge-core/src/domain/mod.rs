//! Pure domain types shared across the voice bridge.
//!
//! Everything here is a plain value type: no sockets, no tasks, no
//! `Arc<Mutex<_>>`. Runtime state (live buffers, cancellation tokens,
//! registries) belongs to the crates that own the corresponding component.

mod audio;
mod knowledge;
mod model_event;
mod output_buffer;
mod session;
mod telephony;
mod tool;

pub use audio::{AudioEncoding, AudioFrame};
pub use knowledge::{KnowledgeHit, KnowledgeQuery};
pub use model_event::{ContentKind, ContentRole, ModelRequestEvent, ModelResponseEvent, StopReason};
pub use output_buffer::{BufferOverflowPolicy, OutputBufferStats};
pub use session::{CallId, TurnState};
pub use telephony::{CloseCode, StartParams, TelephonyInboundEvent, TelephonyOutboundEvent};
pub use tool::{ToolDescriptor, ToolRequest, ToolResult, ToolStatus};
