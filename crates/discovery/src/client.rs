use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use prospector_core::config::DiscoveryConfig;
use prospector_core::http::{ApiRequest, HttpTransport, Method, TransportError};
use prospector_core::secrets::{SecretError, SecretProvider, DISCOVERY_API_KEY};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::{
    Cancellation, Candidate, CreateRunRequest, Enrichment, EnrichmentSet, ExtendedRun, MatchStatus,
    Processor, ResultSet, RunHandle, RunStatus, StatusSnapshot,
};

const RUNS_PATH: &str = "/v1beta/findall/runs";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DiscoveryError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error("remote service rejected the request: HTTP {status}: {body}")]
    Remote { status: u16, body: String },
    #[error("could not decode response body: {message}")]
    Decode { message: String },
    #[error("run did not complete within {waited:?}")]
    WaitTimeout { waited: Duration },
}

impl DiscoveryError {
    /// Coarse class used in the caller-facing envelope so the three
    /// failure families stay distinguishable.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Transport(_) | Self::Decode { .. } => "transport",
            Self::Secret(_) => "configuration",
            Self::Remote { .. } => "remote_rejected",
            Self::WaitTimeout { .. } => "wait_timeout",
        }
    }
}

/// Caller-supplied polling bounds for `wait_for_completion`. Neither
/// value adapts at runtime; there is no backoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(5), max_wait: Duration::from_secs(300) }
    }
}

/// Client for one remote discovery service. Holds configuration and
/// injected capabilities only; all run state lives server-side.
#[derive(Clone)]
pub struct DiscoveryClient {
    transport: Arc<dyn HttpTransport>,
    secrets: Arc<dyn SecretProvider>,
    config: DiscoveryConfig,
}

impl DiscoveryClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        secrets: Arc<dyn SecretProvider>,
        config: DiscoveryConfig,
    ) -> Self {
        Self { transport, secrets, config }
    }

    /// Allocates a server-side run. On success the returned handle
    /// carries the opaque run id the caller must keep for every
    /// subsequent call.
    pub async fn create(&self, request: CreateRunRequest) -> Result<RunHandle, DiscoveryError> {
        let body = serde_json::to_value(&request)
            .map_err(|error| DiscoveryError::Decode { message: error.to_string() })?;
        let api_request = self.request(Method::Post, RUNS_PATH.to_string())?.with_json_body(body);

        let wire: CreateWire = self.send(api_request).await?;
        info!(
            event_name = "discovery.run.created",
            run_id = %wire.findall_id,
            generator = ?wire.generator,
            "discovery run created"
        );

        Ok(RunHandle {
            run_id: wire.findall_id,
            status: wire.status.status,
            is_active: wire.status.is_active,
            generator: wire.generator,
            created_at: wire.created_at,
        })
    }

    /// Pure read; safe to call at any frequency.
    pub async fn get_status(&self, run_id: &str) -> Result<StatusSnapshot, DiscoveryError> {
        let api_request = self.request(Method::Get, format!("{RUNS_PATH}/{run_id}"))?;
        let wire: StatusWire = self.send(api_request).await?;

        Ok(StatusSnapshot {
            run_id: run_id.to_string(),
            status: wire.status.status,
            is_active: wire.status.is_active,
            metrics: wire.status.metrics,
            modified_at: wire.modified_at,
        })
    }

    /// Fetches whatever candidates exist right now and filters them down
    /// to the matched ones. Idempotent; while the run is active the
    /// candidate set may grow between calls.
    pub async fn get_results(&self, run_id: &str) -> Result<ResultSet, DiscoveryError> {
        let api_request = self.request(Method::Get, format!("{RUNS_PATH}/{run_id}/result"))?;
        let wire: ResultWire = self.send(api_request).await?;

        let total_candidates = wire.candidates.len();
        let candidates: Vec<Candidate> = wire
            .candidates
            .into_iter()
            .filter(|candidate| candidate.match_status == MatchStatus::Matched)
            .collect();

        Ok(ResultSet {
            run_id: run_id.to_string(),
            status: wire.run.status.status,
            is_active: wire.run.status.is_active,
            total_candidates,
            matched_count: candidates.len(),
            candidates,
        })
    }

    /// Asks the service to raise the run's match limit. A terminal run
    /// is rejected server-side; the client does not preempt that since
    /// it never caches enough state to do so reliably.
    pub async fn extend(
        &self,
        run_id: &str,
        additional_match_limit: u32,
    ) -> Result<ExtendedRun, DiscoveryError> {
        let api_request = self
            .request(Method::Post, format!("{RUNS_PATH}/{run_id}/extend"))?
            .with_json_body(json!({ "additional_match_limit": additional_match_limit }));
        let wire: ExtendWire = self.send(api_request).await?;

        Ok(ExtendedRun {
            run_id: run_id.to_string(),
            new_match_limit: wire.match_limit,
            objective: wire.objective,
            entity_type: wire.entity_type,
        })
    }

    /// Attaches a schema-driven extraction to the run's matched
    /// candidates. Returns the full enrichment list the run now carries.
    pub async fn enrich(
        &self,
        run_id: &str,
        output_schema: Value,
        processor: Processor,
    ) -> Result<EnrichmentSet, DiscoveryError> {
        let api_request = self
            .request(Method::Post, format!("{RUNS_PATH}/{run_id}/enrich"))?
            .with_json_body(json!({ "processor": processor, "output_schema": output_schema }));
        let wire: EnrichWire = self.send(api_request).await?;

        Ok(EnrichmentSet { run_id: run_id.to_string(), enrichments: wire.enrichments })
    }

    /// Requests the service stop the run. Cancelling an already-terminal
    /// run surfaces the server's rejection verbatim.
    pub async fn cancel(&self, run_id: &str) -> Result<Cancellation, DiscoveryError> {
        let api_request = self.request(Method::Post, format!("{RUNS_PATH}/{run_id}/cancel"))?;
        let wire: CancelWire = self.send(api_request).await?;

        info!(event_name = "discovery.run.cancelled", run_id, "discovery run cancel accepted");
        Ok(Cancellation { run_id: run_id.to_string(), status: wire.status.status })
    }

    /// Polls until the run stops being active, then fetches results.
    ///
    /// Exhausting `max_wait` returns `WaitTimeout` without touching the
    /// run: it keeps running server-side and the caller may wait again,
    /// read partial results, or cancel explicitly. A status failure
    /// during polling propagates immediately; nothing here retries.
    pub async fn wait_for_completion(
        &self,
        run_id: &str,
        options: WaitOptions,
    ) -> Result<ResultSet, DiscoveryError> {
        let started = tokio::time::Instant::now();
        let mut polls: u32 = 0;

        loop {
            if started.elapsed() >= options.max_wait {
                warn!(
                    event_name = "discovery.wait.timeout",
                    run_id,
                    polls,
                    waited_ms = started.elapsed().as_millis() as u64,
                    "run did not finish within the wait budget; leaving it running"
                );
                return Err(DiscoveryError::WaitTimeout { waited: started.elapsed() });
            }

            let snapshot = self.get_status(run_id).await?;
            polls += 1;

            if !snapshot.is_active {
                info!(
                    event_name = "discovery.wait.completed",
                    run_id,
                    polls,
                    status = ?snapshot.status,
                    "run reached a terminal state; fetching results"
                );
                return self.get_results(run_id).await;
            }

            debug!(
                event_name = "discovery.wait.poll",
                run_id,
                polls,
                status = ?snapshot.status,
                "run still active; sleeping before next poll"
            );
            tokio::time::sleep(options.poll_interval).await;
        }
    }

    fn request(&self, method: Method, path: String) -> Result<ApiRequest, DiscoveryError> {
        let api_key = self.secrets.secret(DISCOVERY_API_KEY)?;
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        Ok(ApiRequest::new(method, url, Duration::from_secs(self.config.timeout_secs))
            .with_header("x-api-key", api_key.expose_secret())
            .with_header("content-type", "application/json")
            .with_header("parallel-beta", self.config.beta_header.clone()))
    }

    async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, DiscoveryError> {
        let response = self.transport.execute(request).await?;

        if !response.is_success() {
            return Err(DiscoveryError::Remote { status: response.status, body: response.body });
        }

        serde_json::from_str(&response.body)
            .map_err(|error| DiscoveryError::Decode { message: error.to_string() })
    }
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    status: RunStatus,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    metrics: Map<String, Value>,
}

impl Default for WireStatus {
    fn default() -> Self {
        Self { status: RunStatus::Unknown, is_active: false, metrics: Map::new() }
    }
}

#[derive(Debug, Deserialize)]
struct CreateWire {
    findall_id: String,
    #[serde(default)]
    status: WireStatus,
    #[serde(default)]
    generator: crate::types::Generator,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct StatusWire {
    #[serde(default)]
    status: WireStatus,
    #[serde(default)]
    modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct RunWire {
    #[serde(default)]
    status: WireStatus,
}

#[derive(Debug, Deserialize)]
struct ResultWire {
    #[serde(default)]
    run: RunWire,
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct ExtendWire {
    match_limit: u32,
    #[serde(default)]
    objective: Option<String>,
    #[serde(default)]
    entity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EnrichWire {
    #[serde(default)]
    enrichments: Vec<Enrichment>,
}

#[derive(Debug, Deserialize)]
struct CancelWire {
    #[serde(default)]
    status: WireStatus,
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use prospector_core::config::{AppConfig, DiscoveryConfig};
    use prospector_core::http::{ApiRequest, ApiResponse, HttpTransport, Method, TransportError};
    use prospector_core::secrets::{StaticSecretProvider, DISCOVERY_API_KEY};
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    use super::{DiscoveryClient, DiscoveryError, WaitOptions};
    use crate::types::{CreateRunRequest, MatchCondition, Processor, RunStatus};

    struct ScriptedTransport {
        state: Mutex<ScriptedState>,
    }

    #[derive(Default)]
    struct ScriptedState {
        responses: VecDeque<Result<ApiResponse, TransportError>>,
        fallback: Option<ApiResponse>,
        requests: Vec<ApiRequest>,
    }

    impl ScriptedTransport {
        fn with_responses(responses: Vec<Result<ApiResponse, TransportError>>) -> Self {
            Self {
                state: Mutex::new(ScriptedState {
                    responses: responses.into(),
                    ..ScriptedState::default()
                }),
            }
        }

        fn with_fallback(self, fallback: ApiResponse) -> Self {
            {
                let mut state = self.state.try_lock().expect("transport not yet shared");
                state.fallback = Some(fallback);
            }
            self
        }

        async fn requests(&self) -> Vec<ApiRequest> {
            self.state.lock().await.requests.clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
            let mut state = self.state.lock().await;
            state.requests.push(request.clone());
            match state.responses.pop_front() {
                Some(result) => result,
                None => match &state.fallback {
                    Some(response) => Ok(response.clone()),
                    None => Err(TransportError::Connect {
                        url: request.url,
                        message: "scripted transport exhausted".to_string(),
                    }),
                },
            }
        }
    }

    fn ok(body: Value) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse { status: 200, body: body.to_string() })
    }

    fn rejected(status: u16, body: &str) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse { status, body: body.to_string() })
    }

    fn active_status_body() -> Value {
        json!({ "status": { "status": "running", "is_active": true, "metrics": { "candidates_found": 3 } } })
    }

    fn client_with(transport: Arc<ScriptedTransport>) -> DiscoveryClient {
        let secrets = StaticSecretProvider::new().with_secret(DISCOVERY_API_KEY, "pk-test");
        DiscoveryClient::new(transport, Arc::new(secrets), test_config())
    }

    fn test_config() -> DiscoveryConfig {
        AppConfig::default().discovery
    }

    fn create_request() -> CreateRunRequest {
        CreateRunRequest::new(
            "find robotics startups",
            "companies",
            vec![MatchCondition::new("funding", "raised a Series A in 2024")],
        )
    }

    #[tokio::test]
    async fn create_sends_auth_headers_and_decodes_the_handle() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![ok(json!({
            "findall_id": "fa-1",
            "status": { "status": "queued", "is_active": true },
            "generator": "core",
            "created_at": "2025-09-20T10:00:00Z"
        }))]));
        let client = client_with(transport.clone());

        let handle = client.create(create_request()).await.expect("create should succeed");

        assert_eq!(handle.run_id, "fa-1");
        assert_eq!(handle.status, RunStatus::Queued);
        assert!(handle.is_active);

        let requests = transport.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert!(requests[0].url.ends_with("/v1beta/findall/runs"));
        assert!(requests[0]
            .headers
            .iter()
            .any(|(name, value)| name == "x-api-key" && value == "pk-test"));
        assert!(requests[0]
            .headers
            .iter()
            .any(|(name, value)| name == "parallel-beta" && value == "findall-2025-09-15"));
    }

    #[tokio::test]
    async fn create_surfaces_remote_rejection_verbatim() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![rejected(
            422,
            "match_limit must be between 5 and 1000",
        )]));
        let client = client_with(transport);

        let error = client
            .create(create_request().with_match_limit(2))
            .await
            .expect_err("out-of-range limit should be rejected by the server");

        assert_eq!(
            error,
            DiscoveryError::Remote {
                status: 422,
                body: "match_limit must be between 5 and 1000".to_string()
            }
        );
        assert_eq!(error.error_class(), "remote_rejected");
    }

    #[tokio::test]
    async fn malformed_response_body_is_a_decode_error() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![Ok(ApiResponse {
            status: 200,
            body: "not json at all".to_string(),
        })]));
        let client = client_with(transport);

        let error = client.get_status("fa-1").await.expect_err("garbage body should not decode");
        assert!(matches!(error, DiscoveryError::Decode { .. }));
        assert_eq!(error.error_class(), "transport");
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request_is_issued() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![]));
        let client = DiscoveryClient::new(
            transport.clone(),
            Arc::new(StaticSecretProvider::new()),
            test_config(),
        );

        let error = client.get_status("fa-1").await.expect_err("no key configured");

        assert!(matches!(error, DiscoveryError::Secret(_)));
        assert!(transport.requests().await.is_empty());
    }

    #[tokio::test]
    async fn results_are_filtered_to_matched_candidates_with_both_counts() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![ok(json!({
            "run": { "status": { "status": "completed", "is_active": false } },
            "candidates": [
                { "match_status": "matched", "name": "Acme Robotics" },
                { "match_status": "rejected", "name": "Beta Bakery" },
                { "match_status": "matched", "name": "Cobalt Arms" }
            ]
        }))]));
        let client = client_with(transport);

        let results = client.get_results("fa-1").await.expect("results should decode");

        assert_eq!(results.total_candidates, 3);
        assert_eq!(results.matched_count, 2);
        assert_eq!(results.candidates.len(), 2);
        assert!(results.matched_count <= results.total_candidates);
        assert_eq!(results.status, RunStatus::Completed);
        assert!(!results.is_active);
    }

    #[tokio::test]
    async fn results_are_stable_across_identical_snapshots() {
        let body = json!({
            "run": { "status": { "status": "running", "is_active": true } },
            "candidates": [{ "match_status": "matched", "name": "Acme Robotics" }]
        });
        let transport = Arc::new(ScriptedTransport::with_responses(vec![
            ok(body.clone()),
            ok(body),
        ]));
        let client = client_with(transport);

        let first = client.get_results("fa-1").await.expect("first read");
        let second = client.get_results("fa-1").await.expect("second read");

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn extend_on_a_terminal_run_surfaces_the_server_rejection() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![rejected(
            409,
            "run fa-1 is no longer active",
        )]));
        let client = client_with(transport);

        let error = client.extend("fa-1", 20).await.expect_err("terminal run cannot extend");
        assert!(matches!(error, DiscoveryError::Remote { status: 409, .. }));
    }

    #[tokio::test]
    async fn extend_returns_the_raised_limit() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![ok(json!({
            "match_limit": 30,
            "objective": "find robotics startups",
            "entity_type": "companies"
        }))]));
        let client = client_with(transport.clone());

        let extended = client.extend("fa-1", 20).await.expect("extend should succeed");

        assert_eq!(extended.new_match_limit, 30);
        let requests = transport.requests().await;
        assert!(requests[0].url.ends_with("/runs/fa-1/extend"));
        assert_eq!(requests[0].body, Some(json!({ "additional_match_limit": 20 })));
    }

    #[tokio::test]
    async fn enrich_returns_the_attached_enrichment_list() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![ok(json!({
            "enrichments": [
                { "processor": "core", "output_schema": { "employee_count": "integer" } }
            ]
        }))]));
        let client = client_with(transport.clone());

        let enrichments = client
            .enrich("fa-1", json!({ "employee_count": "integer" }), Processor::Core)
            .await
            .expect("enrich should succeed");

        assert_eq!(enrichments.enrichments.len(), 1);
        let requests = transport.requests().await;
        assert!(requests[0].url.ends_with("/runs/fa-1/enrich"));
    }

    #[tokio::test]
    async fn malformed_output_schema_is_a_remote_rejection_not_a_transport_failure() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![rejected(
            422,
            "output_schema must be an object mapping",
        )]));
        let client = client_with(transport);

        let error = client
            .enrich("fa-1", json!("not a schema"), Processor::Core)
            .await
            .expect_err("bad schema should be rejected");

        assert_eq!(error.error_class(), "remote_rejected");
    }

    #[tokio::test]
    async fn cancel_reports_the_final_status() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![ok(json!({
            "status": { "status": "cancelled", "is_active": false }
        }))]));
        let client = client_with(transport.clone());

        let cancellation = client.cancel("fa-1").await.expect("cancel should succeed");

        assert_eq!(cancellation.status, RunStatus::Cancelled);
        assert!(transport.requests().await[0].url.ends_with("/runs/fa-1/cancel"));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_polls_until_the_run_goes_inactive_then_fetches_results() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![
            ok(active_status_body()),
            ok(active_status_body()),
            ok(json!({ "status": { "status": "completed", "is_active": false } })),
            ok(json!({
                "run": { "status": { "status": "completed", "is_active": false } },
                "candidates": [{ "match_status": "matched", "name": "Acme Robotics" }]
            })),
        ]));
        let client = client_with(transport.clone());

        let results = client
            .wait_for_completion(
                "fa-1",
                WaitOptions {
                    poll_interval: Duration::from_secs(2),
                    max_wait: Duration::from_secs(300),
                },
            )
            .await
            .expect("wait should return results");

        assert_eq!(results.matched_count, 1);
        let requests = transport.requests().await;
        assert_eq!(requests.len(), 4);
        assert!(requests[3].url.ends_with("/runs/fa-1/result"));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_timeout_leaves_the_run_untouched() {
        let transport = Arc::new(
            ScriptedTransport::with_responses(vec![]).with_fallback(ApiResponse {
                status: 200,
                body: active_status_body().to_string(),
            }),
        );
        let client = client_with(transport.clone());

        let error = client
            .wait_for_completion(
                "fa-1",
                WaitOptions {
                    poll_interval: Duration::from_secs(2),
                    max_wait: Duration::from_secs(5),
                },
            )
            .await
            .expect_err("run never completes inside the budget");

        assert!(matches!(error, DiscoveryError::WaitTimeout { .. }));
        assert_eq!(error.error_class(), "wait_timeout");

        // Every request was a status read; no cancel was issued as a
        // side effect of the timeout.
        let requests = transport.requests().await;
        assert!(!requests.is_empty());
        assert!(requests.iter().all(|request| {
            request.method == Method::Get && request.url.ends_with("/runs/fa-1")
        }));

        // The run is still observable afterwards.
        let snapshot = client.get_status("fa-1").await.expect("status should still work");
        assert!(snapshot.is_active);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_propagates_a_transient_status_failure_immediately() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![Err(
            TransportError::Connect {
                url: "https://api.parallel.ai/v1beta/findall/runs/fa-1".to_string(),
                message: "connection refused".to_string(),
            },
        )]));
        let client = client_with(transport.clone());

        let error = client
            .wait_for_completion("fa-1", WaitOptions::default())
            .await
            .expect_err("status failure should not be retried");

        assert!(matches!(error, DiscoveryError::Transport(_)));
        assert_eq!(transport.requests().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_wait_budget_times_out_without_calling_the_service() {
        let transport = Arc::new(ScriptedTransport::with_responses(vec![]));
        let client = client_with(transport.clone());

        let error = client
            .wait_for_completion(
                "fa-1",
                WaitOptions { poll_interval: Duration::from_secs(1), max_wait: Duration::ZERO },
            )
            .await
            .expect_err("zero budget should time out immediately");

        assert!(matches!(error, DiscoveryError::WaitTimeout { .. }));
        assert!(transport.requests().await.is_empty());
    }
}
