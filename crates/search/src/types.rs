use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single search prompt. `model` and `max_tokens` fall back to the
/// configured defaults when unset.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SearchRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_true")]
    pub return_citations: bool,
    #[serde(default = "default_true")]
    pub return_related_questions: bool,
}

fn default_true() -> bool {
    true
}

impl SearchRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            max_tokens: None,
            return_citations: true,
            return_related_questions: true,
        }
    }
}

/// Grounded answer with its sources.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchAnswer {
    pub prompt: String,
    pub model_used: String,
    pub content: String,
    pub citations: Vec<String>,
    pub related_questions: Vec<String>,
    pub usage: Map<String, Value>,
}
