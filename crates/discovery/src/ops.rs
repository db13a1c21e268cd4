//! Envelope boundary for the lifecycle client.
//!
//! Agent tools call through here so every outcome reaches the
//! orchestration layer in the uniform `{success, ...}` shape, with the
//! run id attached to failures for correlation.

use prospector_core::ToolEnvelope;
use serde_json::Value;

use crate::client::{DiscoveryClient, DiscoveryError, WaitOptions};
use crate::types::{CreateRunRequest, Processor};

pub const CREATE_RUN: &str = "create_discovery_run";
pub const GET_STATUS: &str = "get_discovery_status";
pub const GET_RESULTS: &str = "get_discovery_results";
pub const EXTEND_RUN: &str = "extend_discovery_run";
pub const ENRICH_RUN: &str = "enrich_discovery_run";
pub const CANCEL_RUN: &str = "cancel_discovery_run";
pub const AWAIT_RUN: &str = "await_discovery_run";

fn failure(operation: &'static str, error: &DiscoveryError) -> ToolEnvelope {
    ToolEnvelope::failure(operation, error.error_class(), error.to_string())
}

pub async fn create_run(client: &DiscoveryClient, request: CreateRunRequest) -> ToolEnvelope {
    let objective = request.objective.clone();
    match client.create(request).await {
        Ok(handle) => ToolEnvelope::success(CREATE_RUN, handle),
        Err(error) => failure(CREATE_RUN, &error).with_context("objective", objective),
    }
}

pub async fn get_status(client: &DiscoveryClient, run_id: &str) -> ToolEnvelope {
    match client.get_status(run_id).await {
        Ok(snapshot) => ToolEnvelope::success(GET_STATUS, snapshot),
        Err(error) => failure(GET_STATUS, &error).with_context("run_id", run_id),
    }
}

pub async fn get_results(client: &DiscoveryClient, run_id: &str) -> ToolEnvelope {
    match client.get_results(run_id).await {
        Ok(results) => ToolEnvelope::success(GET_RESULTS, results),
        Err(error) => failure(GET_RESULTS, &error).with_context("run_id", run_id),
    }
}

pub async fn extend_run(
    client: &DiscoveryClient,
    run_id: &str,
    additional_match_limit: u32,
) -> ToolEnvelope {
    match client.extend(run_id, additional_match_limit).await {
        Ok(extended) => ToolEnvelope::success(EXTEND_RUN, extended),
        Err(error) => failure(EXTEND_RUN, &error).with_context("run_id", run_id),
    }
}

pub async fn enrich_run(
    client: &DiscoveryClient,
    run_id: &str,
    output_schema: Value,
    processor: Processor,
) -> ToolEnvelope {
    match client.enrich(run_id, output_schema, processor).await {
        Ok(enrichments) => ToolEnvelope::success(ENRICH_RUN, enrichments),
        Err(error) => failure(ENRICH_RUN, &error).with_context("run_id", run_id),
    }
}

pub async fn cancel_run(client: &DiscoveryClient, run_id: &str) -> ToolEnvelope {
    match client.cancel(run_id).await {
        Ok(cancellation) => ToolEnvelope::success(CANCEL_RUN, cancellation),
        Err(error) => failure(CANCEL_RUN, &error).with_context("run_id", run_id),
    }
}

pub async fn await_run(
    client: &DiscoveryClient,
    run_id: &str,
    options: WaitOptions,
) -> ToolEnvelope {
    match client.wait_for_completion(run_id, options).await {
        Ok(results) => ToolEnvelope::success(AWAIT_RUN, results),
        Err(error) => failure(AWAIT_RUN, &error).with_context("run_id", run_id),
    }
}
