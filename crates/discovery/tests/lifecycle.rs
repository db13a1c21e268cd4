//! Full lifecycle exercised through the public API against a scripted
//! transport: create, poll, extend, wait, retrieve, and the cancel and
//! envelope paths.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prospector_core::config::AppConfig;
use prospector_core::http::{ApiRequest, ApiResponse, HttpTransport, TransportError};
use prospector_core::secrets::{StaticSecretProvider, DISCOVERY_API_KEY};
use prospector_discovery::{
    ops, CreateRunRequest, DiscoveryClient, MatchCondition, RunStatus, WaitOptions,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;

struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<ApiResponse, TransportError>>) -> Self {
        Self { responses: Mutex::new(responses.into()) }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.responses.lock().await.pop_front().unwrap_or_else(|| {
            Err(TransportError::Connect {
                url: request.url,
                message: "scripted transport exhausted".to_string(),
            })
        })
    }
}

fn ok(body: Value) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse { status: 200, body: body.to_string() })
}

fn client(responses: Vec<Result<ApiResponse, TransportError>>) -> DiscoveryClient {
    let secrets = StaticSecretProvider::new().with_secret(DISCOVERY_API_KEY, "pk-test");
    DiscoveryClient::new(
        Arc::new(ScriptedTransport::new(responses)),
        Arc::new(secrets),
        AppConfig::default().discovery,
    )
}

#[tokio::test(start_paused = true)]
async fn create_extend_wait_and_retrieve() {
    let client = client(vec![
        // create
        ok(json!({
            "findall_id": "fa-42",
            "status": { "status": "queued", "is_active": true },
            "generator": "pro"
        })),
        // immediate status check after creation
        ok(json!({ "status": { "status": "running", "is_active": true } })),
        // extend while active
        ok(json!({ "match_limit": 25, "objective": "find fintech startups" })),
        // wait: one active poll, then terminal, then results
        ok(json!({ "status": { "status": "running", "is_active": true } })),
        ok(json!({ "status": { "status": "completed", "is_active": false } })),
        ok(json!({
            "run": { "status": { "status": "completed", "is_active": false } },
            "candidates": [
                { "match_status": "matched", "name": "Acme Pay" },
                { "match_status": "rejected", "name": "Beta Bakery" }
            ]
        })),
    ]);

    let handle = client
        .create(CreateRunRequest::new(
            "find fintech startups",
            "companies",
            vec![MatchCondition::new("region", "headquartered in Europe")],
        ))
        .await
        .expect("create should succeed");
    assert_eq!(handle.run_id, "fa-42");
    assert!(!handle.run_id.is_empty());

    let snapshot = client.get_status(&handle.run_id).await.expect("status should succeed");
    assert!(snapshot.is_active);

    let extended = client.extend(&handle.run_id, 15).await.expect("extend should succeed");
    assert_eq!(extended.new_match_limit, 25);

    let results = client
        .wait_for_completion(
            &handle.run_id,
            WaitOptions { poll_interval: Duration::from_secs(2), max_wait: Duration::from_secs(60) },
        )
        .await
        .expect("wait should return results");

    assert_eq!(results.total_candidates, 2);
    assert_eq!(results.matched_count, 1);
    assert!(results.matched_count <= results.total_candidates);
}

#[tokio::test]
async fn cancel_right_after_creation_reports_an_inactive_run() {
    let client = client(vec![
        ok(json!({
            "findall_id": "fa-7",
            "status": { "status": "queued", "is_active": true },
            "generator": "core"
        })),
        ok(json!({ "status": { "status": "cancelled", "is_active": false } })),
        ok(json!({ "status": { "status": "cancelled", "is_active": false } })),
    ]);

    let handle = client
        .create(CreateRunRequest::new(
            "find anything",
            "companies",
            vec![MatchCondition::new("any", "any condition")],
        ))
        .await
        .expect("create should succeed");

    let cancellation = client.cancel(&handle.run_id).await.expect("cancel should succeed");
    assert_eq!(cancellation.status, RunStatus::Cancelled);

    let snapshot = client.get_status(&handle.run_id).await.expect("status should succeed");
    assert!(!snapshot.is_active);
}

#[tokio::test]
async fn envelope_boundary_reports_failures_with_correlation_context() {
    let client = client(vec![Ok(ApiResponse {
        status: 409,
        body: "run fa-9 is no longer active".to_string(),
    })]);

    let envelope = ops::extend_run(&client, "fa-9", 10).await;

    assert!(!envelope.is_success());
    let wire = envelope.to_value();
    assert_eq!(wire["success"], json!(false));
    assert_eq!(wire["operation"], json!("extend_discovery_run"));
    assert_eq!(wire["error_class"], json!("remote_rejected"));
    assert_eq!(wire["run_id"], json!("fa-9"));
    assert!(wire["error"].as_str().expect("error text").contains("fa-9 is no longer active"));
}

#[tokio::test]
async fn envelope_boundary_flattens_successful_payloads() {
    let client = client(vec![ok(json!({
        "status": { "status": "running", "is_active": true, "metrics": { "candidates_found": 12 } }
    }))]);

    let envelope = ops::get_status(&client, "fa-3").await;

    assert!(envelope.is_success());
    let wire = envelope.to_value();
    assert_eq!(wire["success"], json!(true));
    assert_eq!(wire["run_id"], json!("fa-3"));
    assert_eq!(wire["is_active"], json!(true));
    assert_eq!(wire["metrics"]["candidates_found"], json!(12));
}
