//! Loads the static, config-driven tool directory.
//!
//! A dynamic directory backed by an external registry is out of scope;
//! the set of tools a deployment exposes to the model is read once at
//! startup from the same TOML file `BridgeConfig` comes from (an
//! optional `[[tool]]` array), or defaults to a single general-purpose
//! knowledge lookup if none is configured.

use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Deserialize;
use serde_json::json;

use voicebridge_core::ToolDescriptor;

#[derive(Debug, Deserialize)]
struct ToolFile {
    #[serde(default)]
    tool: Vec<ToolEntry>,
}

#[derive(Debug, Deserialize)]
struct ToolEntry {
    name: String,
    description: String,
    knowledge_base_id: String,
}

fn default_entries() -> Vec<(ToolDescriptor, String)> {
    vec![(
        ToolDescriptor {
            name: "search_knowledge_base".into(),
            description: "Search the configured knowledge base for information relevant to the caller's question.".into(),
            input_schema: json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"],
            }),
        },
        "default".into(),
    )]
}

/// Load `(descriptor, knowledge_base_id)` pairs for `StaticToolDirectory`.
pub fn load(config_path: Option<&Path>) -> Result<Vec<(ToolDescriptor, String)>> {
    let Some(path) = config_path else {
        return Ok(default_entries());
    };
    if !path.exists() {
        return Ok(default_entries());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let file: ToolFile =
        toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))?;

    if file.tool.is_empty() {
        return Ok(default_entries());
    }

    Ok(file
        .tool
        .into_iter()
        .map(|entry| {
            let descriptor = ToolDescriptor {
                name: entry.name,
                description: entry.description,
                input_schema: json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } },
                    "required": ["query"],
                }),
            };
            (descriptor, entry.knowledge_base_id)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn no_config_path_yields_the_default_tool() {
        let entries = load(None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.name, "search_knowledge_base");
    }

    #[test]
    fn configured_tools_are_read_from_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[tool]]\nname = \"company_policies\"\ndescription = \"policy lookup\"\nknowledge_base_id = \"kb-policies\"\n"
        )
        .unwrap();

        let entries = load(Some(file.path())).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.name, "company_policies");
        assert_eq!(entries[0].1, "kb-policies");
    }
}
