// crates/askbridge/src/tools/catalog.rs
// Registry of tool adapters, shared read-only across requests

use super::{ToolAdapter, ToolDescriptor, ToolKind, sanitize_tool_name};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Named capability registry. Built once at startup, then shared via `Arc`.
#[derive(Default, Clone)]
pub struct ToolCatalog {
    adapters: BTreeMap<String, Arc<dyn ToolAdapter>>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its descriptor name, replacing any previous one
    pub fn register(&mut self, adapter: Arc<dyn ToolAdapter>) {
        let name = adapter.descriptor().name.clone();
        if self.adapters.insert(name.clone(), adapter).is_some() {
            warn!(tool = %name, "Replaced previously registered tool");
        } else {
            debug!(tool = %name, "Registered tool");
        }
    }

    /// Builder-style register
    pub fn with(mut self, adapter: Arc<dyn ToolAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Look up by name; the name is normalized first
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolAdapter>> {
        self.adapters.get(&sanitize_tool_name(name)).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.adapters.values().map(|a| a.descriptor())
    }

    /// First registered dialogue tool, used for clarification rounds
    pub fn dialogue(&self) -> Option<Arc<dyn ToolAdapter>> {
        self.adapters
            .values()
            .find(|a| a.descriptor().kind == ToolKind::Dialogue)
            .cloned()
    }

    /// Tool listing for planner prompts
    pub fn describe_for_prompt(&self) -> String {
        self.descriptors()
            .map(|d| {
                let params = serde_json::to_string(&d.parameters).unwrap_or_default();
                format!("- {}: {}\n  parameters: {}", d.name, d.description, params)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
