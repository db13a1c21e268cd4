//! Registers agent profiles with the hosted runtime's REST surface.

use std::sync::Arc;
use std::time::Duration;

use prospector_core::config::AgentRuntimeConfig;
use prospector_core::http::{ApiRequest, HttpTransport, Method, TransportError};
use prospector_core::secrets::{SecretError, SecretProvider, AGENT_ACCESS_TOKEN};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::info;

use crate::profiles::AgentProfile;
use crate::tools::ToolRegistry;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error("agent runtime rejected the request: HTTP {status}: {body}")]
    Remote { status: u16, body: String },
    #[error("agent.account_url is not configured; set it in the config file or PROSPECTOR_AGENT_ACCOUNT_URL")]
    MissingAccountUrl,
}

impl BuildError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Secret(_) | Self::MissingAccountUrl => "configuration",
            Self::Remote { .. } => "remote_rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub agent_name: String,
    pub url: String,
    pub tool_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
}

pub struct AgentBuilder {
    transport: Arc<dyn HttpTransport>,
    secrets: Arc<dyn SecretProvider>,
    config: AgentRuntimeConfig,
}

impl AgentBuilder {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        secrets: Arc<dyn SecretProvider>,
        config: AgentRuntimeConfig,
    ) -> Self {
        Self { transport, secrets, config }
    }

    fn agents_url(&self) -> Result<String, BuildError> {
        let account_url = self.config.account_url.as_deref().ok_or(BuildError::MissingAccountUrl)?;
        Ok(format!(
            "{}/api/v2/databases/{}/schemas/{}/agents",
            account_url.trim_end_matches('/'),
            self.config.agent_database,
            self.config.agent_schema,
        ))
    }

    fn request(&self, method: Method, url: String) -> Result<ApiRequest, BuildError> {
        let token = self.secrets.secret(AGENT_ACCESS_TOKEN)?;
        Ok(ApiRequest::new(method, url, Duration::from_secs(self.config.timeout_secs))
            .with_header("authorization", format!("Bearer {}", token.expose_secret()))
            .with_header("x-snowflake-role", self.config.role.clone())
            .with_header("content-type", "application/json"))
    }

    /// Each tool executes as a warehouse function named after the tool.
    fn tool_resources(&self, registry: &ToolRegistry) -> Value {
        let mut resources = Map::new();
        for name in registry.names() {
            resources.insert(
                name.to_string(),
                json!({
                    "type": "function",
                    "execution_environment": {
                        "type": "warehouse",
                        "warehouse": self.config.warehouse,
                    },
                    "identifier": format!(
                        "{}.{}.{}",
                        self.config.functions_database,
                        self.config.functions_schema,
                        name.to_uppercase(),
                    ),
                }),
            );
        }
        Value::Object(resources)
    }

    pub async fn create_agent(
        &self,
        profile: &AgentProfile,
        registry: &ToolRegistry,
    ) -> Result<BuildReport, BuildError> {
        let url = self.agents_url()?;
        let payload = json!({
            "name": profile.name,
            "comment": profile.comment,
            "models": { "orchestration": profile.model },
            "instructions": profile.instructions,
            "tools": registry.specs(),
            "tool_resources": self.tool_resources(registry),
        });

        let request = self.request(Method::Post, url.clone())?.with_json_body(payload);
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(BuildError::Remote { status: response.status, body: response.body });
        }

        info!(
            event_name = "agent.created",
            agent_name = profile.name,
            tool_count = registry.len(),
            "registered agent"
        );
        Ok(BuildReport {
            agent_name: profile.name.to_string(),
            url,
            tool_count: registry.len(),
        })
    }

    /// Deleting an agent that does not exist counts as success; the goal
    /// state is "absent" either way.
    pub async fn delete_agent(&self, name: &str) -> Result<DeleteOutcome, BuildError> {
        let url = format!("{}/{}", self.agents_url()?, name);
        let request = self.request(Method::Delete, url)?;
        let response = self.transport.execute(request).await?;

        match response.status {
            status if response.is_success() => {
                info!(event_name = "agent.deleted", agent_name = name, status, "deleted agent");
                Ok(DeleteOutcome::Deleted)
            }
            404 => Ok(DeleteOutcome::AlreadyAbsent),
            status => Err(BuildError::Remote { status, body: response.body }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use prospector_core::config::AppConfig;
    use prospector_core::http::{ApiRequest, ApiResponse, HttpTransport, Method, TransportError};
    use prospector_core::secrets::{StaticSecretProvider, AGENT_ACCESS_TOKEN};
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    use super::{AgentBuilder, BuildError, DeleteOutcome};
    use crate::profiles::gtm_engineer;
    use crate::specs::{object_schema, ToolSpec};
    use crate::tools::{Tool, ToolRegistry};
    use prospector_core::ToolEnvelope;

    struct ScriptedTransport {
        state: Mutex<(VecDeque<ApiResponse>, Vec<ApiRequest>)>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<ApiResponse>) -> Self {
            Self { state: Mutex::new((responses.into(), Vec::new())) }
        }

        async fn requests(&self) -> Vec<ApiRequest> {
            self.state.lock().await.1.clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
            let mut state = self.state.lock().await;
            state.1.push(request.clone());
            state.0.pop_front().ok_or(TransportError::Connect {
                url: request.url,
                message: "scripted transport exhausted".to_string(),
            })
        }
    }

    struct StubTool;

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &'static str {
            "web_search"
        }

        fn spec(&self) -> ToolSpec {
            ToolSpec::new("web_search", "Search the web.", object_schema(json!({}), &[]))
        }

        async fn execute(&self, input: Value) -> ToolEnvelope {
            ToolEnvelope::success("web_search", input)
        }
    }

    fn builder(transport: Arc<ScriptedTransport>) -> AgentBuilder {
        let mut config = AppConfig::default().agent;
        config.account_url = Some("https://acct.example.com/".to_string());
        let secrets = StaticSecretProvider::new().with_secret(AGENT_ACCESS_TOKEN, "pat-test");
        AgentBuilder::new(transport, Arc::new(secrets), config)
    }

    #[tokio::test]
    async fn create_posts_the_full_agent_payload() {
        let transport = Arc::new(ScriptedTransport::new(vec![ApiResponse {
            status: 200,
            body: "{}".to_string(),
        }]));
        let builder = builder(transport.clone());
        let mut registry = ToolRegistry::new();
        registry.register(StubTool);

        let report = builder
            .create_agent(&gtm_engineer(), &registry)
            .await
            .expect("create should succeed");
        assert_eq!(report.agent_name, "GTM_ENGINEER_AGENT");
        assert_eq!(report.tool_count, 1);

        let requests = transport.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(
            requests[0].url,
            "https://acct.example.com/api/v2/databases/snowflake_intelligence/schemas/agents/agents"
        );
        assert!(requests[0]
            .headers
            .iter()
            .any(|(name, value)| name == "authorization" && value == "Bearer pat-test"));

        let body = requests[0].body.as_ref().expect("body");
        assert_eq!(body["models"]["orchestration"], json!("claude-sonnet-4-5"));
        assert_eq!(body["tools"][0]["tool_spec"]["name"], json!("web_search"));
        let resource = &body["tool_resources"]["web_search"];
        assert_eq!(resource["type"], json!("function"));
        assert_eq!(resource["execution_environment"]["warehouse"], json!("AGENTS_DEMO_WH"));
        assert_eq!(resource["identifier"], json!("AGENTS_DEMO.PUBLIC.WEB_SEARCH"));
    }

    #[tokio::test]
    async fn delete_treats_missing_agent_as_already_absent() {
        let transport = Arc::new(ScriptedTransport::new(vec![ApiResponse {
            status: 404,
            body: "not found".to_string(),
        }]));
        let builder = builder(transport.clone());

        let outcome = builder.delete_agent("GTM_ENGINEER_AGENT").await.expect("404 is absorbed");
        assert_eq!(outcome, DeleteOutcome::AlreadyAbsent);

        let requests = transport.requests().await;
        assert_eq!(requests[0].method, Method::Delete);
        assert!(requests[0].url.ends_with("/agents/GTM_ENGINEER_AGENT"));
    }

    #[tokio::test]
    async fn delete_surfaces_other_remote_errors() {
        let transport = Arc::new(ScriptedTransport::new(vec![ApiResponse {
            status: 500,
            body: "internal error".to_string(),
        }]));
        let builder = builder(transport);

        let error = builder.delete_agent("X").await.expect_err("500 should surface");
        assert!(matches!(error, BuildError::Remote { status: 500, .. }));
        assert_eq!(error.error_class(), "remote_rejected");
    }

    #[tokio::test]
    async fn missing_account_url_fails_before_any_request() {
        let transport = Arc::new(ScriptedTransport::new(Vec::new()));
        let secrets = StaticSecretProvider::new().with_secret(AGENT_ACCESS_TOKEN, "pat-test");
        let builder =
            AgentBuilder::new(transport.clone(), Arc::new(secrets), AppConfig::default().agent);

        let error = builder.delete_agent("X").await.expect_err("missing url should fail");
        assert!(matches!(error, BuildError::MissingAccountUrl));
        assert_eq!(error.error_class(), "configuration");
        assert!(transport.requests().await.is_empty());
    }
}
