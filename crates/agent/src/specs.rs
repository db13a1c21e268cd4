//! Declarative tool specifications in the shape the hosted runtime
//! expects: a `tool_spec` wrapper around a generic name, description,
//! and JSON schema for the input.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

#[derive(Clone, Debug, PartialEq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

impl ToolSpec {
    pub fn new(name: &'static str, description: &'static str, input_schema: Value) -> Self {
        Self { name, description, input_schema }
    }

    /// Wire shape consumed by the agent runtime.
    pub fn to_value(&self) -> Value {
        json!({
            "tool_spec": {
                "type": "generic",
                "name": self.name,
                "description": self.description,
                "input_schema": self.input_schema,
            }
        })
    }
}

impl Serialize for ToolSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Object schema with the given properties, listing which are required.
pub fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
