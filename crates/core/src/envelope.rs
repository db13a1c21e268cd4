//! The uniform result shape every tool hands back to the orchestration
//! layer.
//!
//! An operation either fully succeeds or it is reported as failed; there
//! is no partial-success representation. Failures carry the operation
//! name and whatever correlation context the caller attached (typically
//! a run id) so they can be traced back, plus an `error_class` that
//! distinguishes transport failures, remote rejections, and client-local
//! wait timeouts.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

#[derive(Clone, Debug, PartialEq)]
pub struct ToolEnvelope {
    operation: &'static str,
    outcome: Outcome,
    context: Vec<(&'static str, String)>,
}

#[derive(Clone, Debug, PartialEq)]
enum Outcome {
    Success(Value),
    Failure { error: String, error_class: &'static str },
}

impl ToolEnvelope {
    /// Wraps a successful payload. Non-object payloads land under a
    /// `result` key so the wire shape stays a flat mapping.
    pub fn success(operation: &'static str, payload: impl Serialize) -> Self {
        let payload = serde_json::to_value(payload)
            .unwrap_or_else(|error| json!({ "result": error.to_string() }));
        Self { operation, outcome: Outcome::Success(payload), context: Vec::new() }
    }

    pub fn failure(
        operation: &'static str,
        error_class: &'static str,
        error: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            outcome: Outcome::Failure { error: error.into(), error_class },
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure { error, .. } => Some(error),
        }
    }

    pub fn error_class(&self) -> Option<&'static str> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure { error_class, .. } => Some(error_class),
        }
    }

    /// Flattened wire shape: `success` + `operation` + payload fields on
    /// success; `success` + `operation` + `error` + `error_class` +
    /// context fields on failure.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("success".to_string(), Value::Bool(self.is_success()));
        map.insert("operation".to_string(), Value::String(self.operation.to_string()));

        match &self.outcome {
            Outcome::Success(payload) => {
                if let Value::Object(fields) = payload {
                    for (key, value) in fields {
                        map.entry(key.clone()).or_insert_with(|| value.clone());
                    }
                } else {
                    map.insert("result".to_string(), payload.clone());
                }
            }
            Outcome::Failure { error, error_class } => {
                map.insert("error".to_string(), Value::String(error.clone()));
                map.insert("error_class".to_string(), Value::String((*error_class).to_string()));
            }
        }

        for (key, value) in &self.context {
            map.entry((*key).to_string()).or_insert_with(|| Value::String(value.clone()));
        }

        Value::Object(map)
    }
}

impl Serialize for ToolEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
