#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    AudioEncoding, AudioFrame, BufferOverflowPolicy, CallId, CloseCode, ContentKind, ContentRole,
    KnowledgeHit, KnowledgeQuery, ModelRequestEvent, ModelResponseEvent, OutputBufferStats,
    StartParams, StopReason, TelephonyInboundEvent, TelephonyOutboundEvent, ToolDescriptor,
    ToolRequest, ToolResult, ToolStatus, TurnState,
};
pub use events::BridgeEvent;
pub use ports::{
    AppEventEmitter, BridgeError, KnowledgeError, KnowledgeServicePort, NoopEmitter,
    TelephonyReceiver, TelephonySender, ToolDirectoryPort,
};
pub use settings::{
    BridgeConfig, BridgeConfigUpdate, ConfigError, ForwardingMode, InputConfig, ModelConfig,
    PacerConfig, SessionConfig, ToolConfig, TurnConfig, validate_config,
};
