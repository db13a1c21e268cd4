use async_trait::async_trait;
use prospector_core::ToolEnvelope;
use prospector_search::client::WEB_SEARCH;
use prospector_search::{SearchClient, SearchRequest};
use serde_json::{json, Value};

use super::{invalid_input, Tool};
use crate::specs::{object_schema, ToolSpec};

pub struct WebSearchTool {
    client: SearchClient,
}

impl WebSearchTool {
    pub fn new(client: SearchClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        WEB_SEARCH
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            WEB_SEARCH,
            "Answer a question with a grounded web search. Fast and single-shot; use a \
             discovery run instead when the goal is a list of matching entities.",
            object_schema(
                json!({
                    "prompt": { "type": "string", "description": "The question to answer" },
                    "model": { "type": "string", "description": "Override the configured search model" },
                    "max_tokens": { "type": "integer", "description": "Cap on the answer length" }
                }),
                &["prompt"],
            ),
        )
    }

    async fn execute(&self, input: Value) -> ToolEnvelope {
        let request: SearchRequest = match serde_json::from_value(input) {
            Ok(request) => request,
            Err(error) => return invalid_input(self.name(), &error),
        };
        self.client.web_search_envelope(request).await
    }
}
