//! Tools wrapping the discovery run lifecycle.
//!
//! Each tool deserializes its JSON input into the client's request types
//! and delegates to the envelope boundary in `prospector_discovery::ops`.

use std::time::Duration;

use async_trait::async_trait;
use prospector_core::ToolEnvelope;
use prospector_discovery::{
    ops, CreateRunRequest, DiscoveryClient, Generator, MatchCondition, Processor, WaitOptions,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{invalid_input, Tool};
use crate::specs::{object_schema, ToolSpec};

#[derive(Deserialize)]
struct CreateInput {
    objective: String,
    entity_type: String,
    match_conditions: Vec<MatchCondition>,
    #[serde(default)]
    generator: Option<Generator>,
    #[serde(default)]
    match_limit: Option<u32>,
    #[serde(default)]
    exclude_list: Vec<String>,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Deserialize)]
struct RunIdInput {
    run_id: String,
}

#[derive(Deserialize)]
struct ExtendInput {
    run_id: String,
    additional_match_limit: u32,
}

#[derive(Deserialize)]
struct EnrichInput {
    run_id: String,
    output_schema: Value,
    #[serde(default)]
    processor: Processor,
}

#[derive(Deserialize)]
struct AwaitInput {
    run_id: String,
    #[serde(default)]
    poll_interval_secs: Option<u64>,
    #[serde(default)]
    max_wait_secs: Option<u64>,
}

fn run_id_schema() -> Value {
    object_schema(
        json!({ "run_id": { "type": "string", "description": "Identifier returned by create_discovery_run" } }),
        &["run_id"],
    )
}

pub struct CreateDiscoveryRunTool {
    client: DiscoveryClient,
}

impl CreateDiscoveryRunTool {
    pub fn new(client: DiscoveryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CreateDiscoveryRunTool {
    fn name(&self) -> &'static str {
        ops::CREATE_RUN
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            ops::CREATE_RUN,
            "Start an asynchronous entity-discovery run. Returns a run_id used by every \
             other discovery tool; the run keeps working server-side after this returns.",
            object_schema(
                json!({
                    "objective": { "type": "string", "description": "Natural-language description of the entities to find" },
                    "entity_type": { "type": "string", "description": "Kind of entity, e.g. 'companies' or 'people'" },
                    "match_conditions": {
                        "type": "array",
                        "description": "Conditions every matched entity must satisfy",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string" },
                                "description": { "type": "string" }
                            },
                            "required": ["name", "description"]
                        }
                    },
                    "generator": { "type": "string", "description": "Engine tier: base, core (default), pro, or preview" },
                    "match_limit": { "type": "integer", "description": "Maximum matches to find (service accepts 5-1000, default 10)" },
                    "exclude_list": { "type": "array", "items": { "type": "string" }, "description": "Entities to skip" }
                }),
                &["objective", "entity_type", "match_conditions"],
            ),
        )
    }

    async fn execute(&self, input: Value) -> ToolEnvelope {
        let input: CreateInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(error) => return invalid_input(self.name(), &error),
        };

        let mut request =
            CreateRunRequest::new(input.objective, input.entity_type, input.match_conditions);
        if let Some(generator) = input.generator {
            request = request.with_generator(generator);
        }
        if let Some(match_limit) = input.match_limit {
            request = request.with_match_limit(match_limit);
        }
        if !input.exclude_list.is_empty() {
            request = request.with_exclude_list(input.exclude_list);
        }
        if let Some(metadata) = input.metadata {
            request = request.with_metadata(metadata);
        }

        ops::create_run(&self.client, request).await
    }
}

pub struct GetDiscoveryStatusTool {
    client: DiscoveryClient,
}

impl GetDiscoveryStatusTool {
    pub fn new(client: DiscoveryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetDiscoveryStatusTool {
    fn name(&self) -> &'static str {
        ops::GET_STATUS
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            ops::GET_STATUS,
            "Check the current status of a discovery run. Poll until is_active is false, \
             then retrieve results.",
            run_id_schema(),
        )
    }

    async fn execute(&self, input: Value) -> ToolEnvelope {
        let input: RunIdInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(error) => return invalid_input(self.name(), &error),
        };
        ops::get_status(&self.client, &input.run_id).await
    }
}

pub struct GetDiscoveryResultsTool {
    client: DiscoveryClient,
}

impl GetDiscoveryResultsTool {
    pub fn new(client: DiscoveryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetDiscoveryResultsTool {
    fn name(&self) -> &'static str {
        ops::GET_RESULTS
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            ops::GET_RESULTS,
            "Retrieve the matched candidates of a discovery run. Safe to call while the \
             run is still active; returns whatever has matched so far.",
            run_id_schema(),
        )
    }

    async fn execute(&self, input: Value) -> ToolEnvelope {
        let input: RunIdInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(error) => return invalid_input(self.name(), &error),
        };
        ops::get_results(&self.client, &input.run_id).await
    }
}

pub struct ExtendDiscoveryRunTool {
    client: DiscoveryClient,
}

impl ExtendDiscoveryRunTool {
    pub fn new(client: DiscoveryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for ExtendDiscoveryRunTool {
    fn name(&self) -> &'static str {
        ops::EXTEND_RUN
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            ops::EXTEND_RUN,
            "Raise the match limit of an active discovery run so it keeps searching for \
             more entities. Fails if the run has already finished.",
            object_schema(
                json!({
                    "run_id": { "type": "string" },
                    "additional_match_limit": { "type": "integer", "description": "How many more matches to look for" }
                }),
                &["run_id", "additional_match_limit"],
            ),
        )
    }

    async fn execute(&self, input: Value) -> ToolEnvelope {
        let input: ExtendInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(error) => return invalid_input(self.name(), &error),
        };
        ops::extend_run(&self.client, &input.run_id, input.additional_match_limit).await
    }
}

pub struct EnrichDiscoveryRunTool {
    client: DiscoveryClient,
}

impl EnrichDiscoveryRunTool {
    pub fn new(client: DiscoveryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for EnrichDiscoveryRunTool {
    fn name(&self) -> &'static str {
        ops::ENRICH_RUN
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            ops::ENRICH_RUN,
            "Attach a schema-driven enrichment to a discovery run, extracting extra \
             fields for every matched candidate.",
            object_schema(
                json!({
                    "run_id": { "type": "string" },
                    "output_schema": { "type": "object", "description": "JSON schema describing the fields to extract" },
                    "processor": { "type": "string", "description": "Engine tier: base, core (default), or pro" }
                }),
                &["run_id", "output_schema"],
            ),
        )
    }

    async fn execute(&self, input: Value) -> ToolEnvelope {
        let input: EnrichInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(error) => return invalid_input(self.name(), &error),
        };
        ops::enrich_run(&self.client, &input.run_id, input.output_schema, input.processor).await
    }
}

pub struct CancelDiscoveryRunTool {
    client: DiscoveryClient,
}

impl CancelDiscoveryRunTool {
    pub fn new(client: DiscoveryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CancelDiscoveryRunTool {
    fn name(&self) -> &'static str {
        ops::CANCEL_RUN
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            ops::CANCEL_RUN,
            "Stop an active discovery run. Candidates found before cancellation remain \
             retrievable.",
            run_id_schema(),
        )
    }

    async fn execute(&self, input: Value) -> ToolEnvelope {
        let input: RunIdInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(error) => return invalid_input(self.name(), &error),
        };
        ops::cancel_run(&self.client, &input.run_id).await
    }
}

pub struct AwaitDiscoveryRunTool {
    client: DiscoveryClient,
}

impl AwaitDiscoveryRunTool {
    pub fn new(client: DiscoveryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for AwaitDiscoveryRunTool {
    fn name(&self) -> &'static str {
        ops::AWAIT_RUN
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            ops::AWAIT_RUN,
            "Block until a discovery run reaches a terminal state, then return its \
             results. Times out without cancelling the run.",
            object_schema(
                json!({
                    "run_id": { "type": "string" },
                    "poll_interval_secs": { "type": "integer", "description": "Seconds between status checks (default 5)" },
                    "max_wait_secs": { "type": "integer", "description": "Give up after this many seconds (default 300)" }
                }),
                &["run_id"],
            ),
        )
    }

    async fn execute(&self, input: Value) -> ToolEnvelope {
        let input: AwaitInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(error) => return invalid_input(self.name(), &error),
        };

        let mut options = WaitOptions::default();
        if let Some(secs) = input.poll_interval_secs {
            options.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = input.max_wait_secs {
            options.max_wait = Duration::from_secs(secs);
        }

        ops::await_run(&self.client, &input.run_id, options).await
    }
}
