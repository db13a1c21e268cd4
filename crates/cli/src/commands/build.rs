use std::sync::Arc;

use prospector_agent::tools::{
    AwaitDiscoveryRunTool, CancelDiscoveryRunTool, CreateDiscoveryRunTool, EnrichDiscoveryRunTool,
    ExtendDiscoveryRunTool, GetDiscoveryResultsTool, GetDiscoveryStatusTool, WebSearchTool,
};
use prospector_agent::{profiles, AgentBuilder, ToolRegistry};
use prospector_core::config::AppConfig;
use prospector_core::http::ReqwestTransport;
use prospector_discovery::DiscoveryClient;
use prospector_search::SearchClient;
use serde_json::json;

use crate::commands::{secret_provider, CommandResult};

const COMMAND: &str = "build";

pub fn run(config: &AppConfig, profile_name: &str, delete_first: bool) -> CommandResult {
    let Some(profile) = profiles::profile(profile_name) else {
        return CommandResult::failure(
            COMMAND,
            "unknown_profile",
            format!(
                "unknown profile `{profile_name}` (available: {})",
                profiles::profile_names().join(", ")
            ),
            2,
        );
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            )
        }
    };

    let transport = Arc::new(ReqwestTransport::new());
    let secrets = secret_provider(config);
    let registry = tool_registry(
        DiscoveryClient::new(transport.clone(), secrets.clone(), config.discovery.clone()),
        SearchClient::new(transport.clone(), secrets.clone(), config.search.clone()),
    );
    let builder = AgentBuilder::new(transport, secrets, config.agent.clone());

    runtime.block_on(async {
        if delete_first {
            match builder.delete_agent(profile.name).await {
                Ok(outcome) => {
                    tracing::info!(
                        event_name = "cli.build.pre_delete",
                        agent_name = profile.name,
                        outcome = ?outcome,
                        "pre-delete finished"
                    );
                }
                Err(error) => {
                    return CommandResult::failure(COMMAND, error.error_class(), error.to_string(), 1)
                }
            }
        }

        match builder.create_agent(&profile, &registry).await {
            Ok(report) => CommandResult::json(
                0,
                &json!({
                    "command": COMMAND,
                    "status": "ok",
                    "agent_name": report.agent_name,
                    "url": report.url,
                    "tool_count": report.tool_count,
                }),
            ),
            Err(error) => CommandResult::failure(COMMAND, error.error_class(), error.to_string(), 1),
        }
    })
}

/// Every profile ships with the full discovery and search tool set.
fn tool_registry(discovery: DiscoveryClient, search: SearchClient) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(CreateDiscoveryRunTool::new(discovery.clone()));
    registry.register(GetDiscoveryStatusTool::new(discovery.clone()));
    registry.register(GetDiscoveryResultsTool::new(discovery.clone()));
    registry.register(ExtendDiscoveryRunTool::new(discovery.clone()));
    registry.register(EnrichDiscoveryRunTool::new(discovery.clone()));
    registry.register(CancelDiscoveryRunTool::new(discovery.clone()));
    registry.register(AwaitDiscoveryRunTool::new(discovery));
    registry.register(WebSearchTool::new(search));
    registry
}
