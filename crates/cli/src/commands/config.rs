use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use prospector_core::config::AppConfig;
use toml::Value;

pub fn run(config: &AppConfig) -> String {
    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let mut push = |key_path: &str, value: &str, env_key: &str| {
        lines.push(render_line(
            key_path,
            value,
            field_source(
                key_path,
                Some(env_key),
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        ));
    };

    push("discovery.base_url", &config.discovery.base_url, "PROSPECTOR_DISCOVERY_BASE_URL");
    push(
        "discovery.api_key",
        redact_optional(config.discovery.api_key.is_some()),
        "PROSPECTOR_DISCOVERY_API_KEY",
    );
    push(
        "discovery.timeout_secs",
        &config.discovery.timeout_secs.to_string(),
        "PROSPECTOR_DISCOVERY_TIMEOUT_SECS",
    );
    push("discovery.beta_header", &config.discovery.beta_header, "PROSPECTOR_DISCOVERY_BETA_HEADER");

    push("search.api_url", &config.search.api_url, "PROSPECTOR_SEARCH_API_URL");
    push(
        "search.api_key",
        redact_optional(config.search.api_key.is_some()),
        "PROSPECTOR_SEARCH_API_KEY",
    );
    push("search.model", &config.search.model, "PROSPECTOR_SEARCH_MODEL");
    push("search.max_tokens", &config.search.max_tokens.to_string(), "PROSPECTOR_SEARCH_MAX_TOKENS");
    push(
        "search.timeout_secs",
        &config.search.timeout_secs.to_string(),
        "PROSPECTOR_SEARCH_TIMEOUT_SECS",
    );

    push(
        "agent.account_url",
        config.agent.account_url.as_deref().unwrap_or("<unset>"),
        "PROSPECTOR_AGENT_ACCOUNT_URL",
    );
    push(
        "agent.access_token",
        redact_optional(config.agent.access_token.is_some()),
        "PROSPECTOR_AGENT_ACCESS_TOKEN",
    );
    push("agent.role", &config.agent.role, "PROSPECTOR_AGENT_ROLE");
    push("agent.agent_database", &config.agent.agent_database, "PROSPECTOR_AGENT_DATABASE");
    push("agent.agent_schema", &config.agent.agent_schema, "PROSPECTOR_AGENT_SCHEMA");
    push(
        "agent.functions_database",
        &config.agent.functions_database,
        "PROSPECTOR_AGENT_FUNCTIONS_DATABASE",
    );
    push(
        "agent.functions_schema",
        &config.agent.functions_schema,
        "PROSPECTOR_AGENT_FUNCTIONS_SCHEMA",
    );
    push("agent.warehouse", &config.agent.warehouse, "PROSPECTOR_AGENT_WAREHOUSE");

    push("logging.level", &config.logging.level, "PROSPECTOR_LOGGING_LEVEL");
    push("logging.format", &format!("{:?}", config.logging.format), "PROSPECTOR_LOGGING_FORMAT");

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("prospector.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/prospector.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_optional(present: bool) -> &'static str {
    if present {
        "<redacted>"
    } else {
        "<unset>"
    }
}
