//! Tool trait and registry.
//!
//! Every tool takes loosely-typed JSON input and returns a
//! [`ToolEnvelope`], so the orchestration layer never has to handle a
//! panic or a bare error type. Input parsing failures are reported
//! through the envelope like any other failure.

mod discovery;
mod search;

use std::collections::HashMap;

use async_trait::async_trait;
use prospector_core::ToolEnvelope;
use serde_json::Value;

use crate::specs::ToolSpec;

pub use discovery::{
    AwaitDiscoveryRunTool, CancelDiscoveryRunTool, CreateDiscoveryRunTool, EnrichDiscoveryRunTool,
    ExtendDiscoveryRunTool, GetDiscoveryResultsTool, GetDiscoveryStatusTool,
};
pub use search::WebSearchTool;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn spec(&self) -> ToolSpec;
    async fn execute(&self, input: Value) -> ToolEnvelope;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    /// Sorted for stable output in logs and agent payloads.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.tools.values().map(|tool| tool.name()).collect();
        names.sort_unstable();
        names
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.spec())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Failure envelope for input that did not match the tool's schema.
fn invalid_input(operation: &'static str, error: &serde_json::Error) -> ToolEnvelope {
    ToolEnvelope::failure(operation, "invalid_input", format!("invalid tool input: {error}"))
}
