//! CLI bootstrap — the composition root.
//!
//! This is the only place that constructs concrete adapters: the model
//! driver, the knowledge HTTP client, the static tool directory, and the
//! process-wide session registry are all built here and handed to the
//! transport adapter as one `BridgeContext`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use voicebridge_axum::{BridgeContext, HttpKnowledgeClient};
use voicebridge_core::{BridgeConfig, KnowledgeServicePort, ToolDirectoryPort, validate_config};
use voicebridge_model::ModelDriver;
use voicebridge_session::SessionRegistry;
use voicebridge_tools::StaticToolDirectory;

use crate::event_emitter::TracingEventEmitter;
use crate::{config, tool_directory};

/// Everything `serve` needs to bring a running server up: the resolved
/// configuration plus the context built from it.
pub struct Bootstrapped {
    pub config: BridgeConfig,
    pub context: Arc<BridgeContext>,
}

/// Load configuration, validate it, and construct every long-lived
/// collaborator the bridge needs for the life of the process.
pub fn bootstrap(config_path: Option<&Path>, knowledge_base_url: Option<String>) -> Result<Bootstrapped> {
    let bridge_config = config::load(config_path)?;
    validate_config(&bridge_config).map_err(anyhow::Error::from)?;

    let model = Arc::new(ModelDriver::new(&bridge_config.model).map_err(anyhow::Error::from)?);

    let knowledge_base_url =
        knowledge_base_url.unwrap_or_else(|| "http://127.0.0.1:9090".to_string());
    let knowledge: Arc<dyn KnowledgeServicePort> =
        Arc::new(HttpKnowledgeClient::new(knowledge_base_url));

    let tool_entries = tool_directory::load(config_path)?;
    let directory: Arc<dyn ToolDirectoryPort> = Arc::new(StaticToolDirectory::new(tool_entries));

    let registry = SessionRegistry::new();
    let emitter = Arc::new(TracingEventEmitter::new());

    let context = Arc::new(BridgeContext {
        registry,
        model,
        knowledge,
        directory,
        config: bridge_config.clone(),
        emitter,
    });

    Ok(Bootstrapped {
        config: bridge_config,
        context,
    })
}
