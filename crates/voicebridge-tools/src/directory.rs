use std::collections::HashMap;

use voicebridge_core::{ToolDescriptor, ToolDirectoryPort};

/// An in-memory tool directory built once at startup from configuration.
///
/// Each enabled tool bijectively names exactly one knowledge base; this is
/// the only piece of configuration `ToolRunner` needs to turn a `toolUse`
/// name into a `KnowledgeQuery`.
pub struct StaticToolDirectory {
    tools: Vec<ToolDescriptor>,
    knowledge_bases: HashMap<String, String>,
}

impl StaticToolDirectory {
    /// Build a directory from `(descriptor, knowledge_base_id)` pairs.
    #[must_use]
    pub fn new(entries: Vec<(ToolDescriptor, String)>) -> Self {
        let mut tools = Vec::with_capacity(entries.len());
        let mut knowledge_bases = HashMap::with_capacity(entries.len());
        for (descriptor, kb_id) in entries {
            knowledge_bases.insert(descriptor.name.clone(), kb_id);
            tools.push(descriptor);
        }
        Self {
            tools,
            knowledge_bases,
        }
    }
}

impl ToolDirectoryPort for StaticToolDirectory {
    fn enabled_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.clone()
    }

    fn resolve_knowledge_base(&self, tool_name: &str) -> Option<String> {
        self.knowledge_bases.get(tool_name).cloned()
    }
}
