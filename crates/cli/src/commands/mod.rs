pub mod build;
pub mod config;
pub mod discover;
pub mod profiles;

use std::sync::Arc;

use prospector_core::config::AppConfig;
use prospector_core::secrets::{
    EnvSecretProvider, SecretProvider, StaticSecretProvider, AGENT_ACCESS_TOKEN,
    DISCOVERY_API_KEY, SEARCH_API_KEY,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Structured payloads (reports, envelopes) are printed as-is.
    pub fn json(exit_code: u8, payload: &Value) -> Self {
        let output = serde_json::to_string_pretty(payload)
            .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"));
        Self { exit_code, output }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Wires a secret provider from the loaded config, falling back to the
/// vendors' conventional environment variables for anything the config
/// leaves unset. Entries missing from both surface later as
/// configuration errors from the client that actually needs them.
pub(crate) fn secret_provider(config: &AppConfig) -> Arc<StaticSecretProvider> {
    let fallback = EnvSecretProvider::new()
        .with_mapping(DISCOVERY_API_KEY, "PARALLEL_API_KEY")
        .with_mapping(SEARCH_API_KEY, "PERPLEXITY_API_KEY")
        .with_mapping(AGENT_ACCESS_TOKEN, "SNOWFLAKE_PAT");

    let mut provider = StaticSecretProvider::new();
    for (name, configured) in [
        (DISCOVERY_API_KEY, config.discovery.api_key.as_ref()),
        (SEARCH_API_KEY, config.search.api_key.as_ref()),
        (AGENT_ACCESS_TOKEN, config.agent.access_token.as_ref()),
    ] {
        if let Some(secret) = configured {
            provider.insert(name, secret.expose_secret());
        } else if let Ok(secret) = fallback.secret(name) {
            provider.insert(name, secret.expose_secret());
        }
    }
    Arc::new(provider)
}
