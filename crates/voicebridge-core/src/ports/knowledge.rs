use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{KnowledgeHit, KnowledgeQuery, ToolDescriptor};

/// Errors a knowledge retrieval backend can report back to `ToolRunner`.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("knowledge base not found: {0}")]
    UnknownKnowledgeBase(String),

    #[error("retrieval backend unavailable: {0}")]
    Unavailable(String),

    #[error("retrieval timed out")]
    Timeout,
}

/// External retrieval collaborator `ToolRunner` calls to answer a tool's
/// `query` input. Concrete backend (vector store, search index, ...) is an
/// adapter concern outside this crate.
#[async_trait]
pub trait KnowledgeServicePort: Send + Sync {
    async fn retrieve(&self, query: KnowledgeQuery) -> Result<Vec<KnowledgeHit>, KnowledgeError>;
}

/// Directory of tools the model is allowed to call, and which knowledge
/// base each one queries. Kept separate from `KnowledgeServicePort` because
/// resolving a tool name is a configuration lookup, not a retrieval call.
pub trait ToolDirectoryPort: Send + Sync {
    /// Tools currently enabled for the bridge, as published to the model
    /// at session start.
    fn enabled_tools(&self) -> Vec<ToolDescriptor>;

    /// Maps an enabled tool name to the knowledge base it queries. Returns
    /// `None` for a name that is not in `enabled_tools()`.
    fn resolve_knowledge_base(&self, tool_name: &str) -> Option<String>;
}
