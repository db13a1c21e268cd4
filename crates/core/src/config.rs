use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub discovery: DiscoveryConfig,
    pub search: SearchConfig,
    pub agent: AgentRuntimeConfig,
    pub logging: LoggingConfig,
}

/// Remote entity-discovery service (FindAll-style run API).
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
    pub beta_header: String,
}

/// Web search completion API.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub api_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// Hosted agent-runtime API where agent definitions are registered,
/// plus the warehouse location tool functions execute in.
#[derive(Clone, Debug)]
pub struct AgentRuntimeConfig {
    pub account_url: Option<String>,
    pub access_token: Option<SecretString>,
    pub role: String,
    pub agent_database: String,
    pub agent_schema: String,
    pub functions_database: String,
    pub functions_schema: String,
    pub warehouse: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub discovery_base_url: Option<String>,
    pub discovery_api_key: Option<String>,
    pub search_api_key: Option<String>,
    pub agent_account_url: Option<String>,
    pub agent_access_token: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig {
                base_url: "https://api.parallel.ai".to_string(),
                api_key: None,
                timeout_secs: 120,
                beta_header: "findall-2025-09-15".to_string(),
            },
            search: SearchConfig {
                api_url: "https://api.perplexity.ai/chat/completions".to_string(),
                api_key: None,
                model: "sonar-pro".to_string(),
                max_tokens: 4000,
                timeout_secs: 60,
            },
            agent: AgentRuntimeConfig {
                account_url: None,
                access_token: None,
                role: "AGENTS_SERVICE_ROLE".to_string(),
                agent_database: "snowflake_intelligence".to_string(),
                agent_schema: "agents".to_string(),
                functions_database: "AGENTS_DEMO".to_string(),
                functions_schema: "PUBLIC".to_string(),
                warehouse: "AGENTS_DEMO_WH".to_string(),
                timeout_secs: 60,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("prospector.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(discovery) = patch.discovery {
            if let Some(base_url) = discovery.base_url {
                self.discovery.base_url = base_url;
            }
            if let Some(discovery_api_key_value) = discovery.api_key {
                self.discovery.api_key = Some(secret_value(discovery_api_key_value));
            }
            if let Some(timeout_secs) = discovery.timeout_secs {
                self.discovery.timeout_secs = timeout_secs;
            }
            if let Some(beta_header) = discovery.beta_header {
                self.discovery.beta_header = beta_header;
            }
        }

        if let Some(search) = patch.search {
            if let Some(api_url) = search.api_url {
                self.search.api_url = api_url;
            }
            if let Some(search_api_key_value) = search.api_key {
                self.search.api_key = Some(secret_value(search_api_key_value));
            }
            if let Some(model) = search.model {
                self.search.model = model;
            }
            if let Some(max_tokens) = search.max_tokens {
                self.search.max_tokens = max_tokens;
            }
            if let Some(timeout_secs) = search.timeout_secs {
                self.search.timeout_secs = timeout_secs;
            }
        }

        if let Some(agent) = patch.agent {
            if let Some(account_url) = agent.account_url {
                self.agent.account_url = Some(account_url);
            }
            if let Some(agent_access_token_value) = agent.access_token {
                self.agent.access_token = Some(secret_value(agent_access_token_value));
            }
            if let Some(role) = agent.role {
                self.agent.role = role;
            }
            if let Some(agent_database) = agent.agent_database {
                self.agent.agent_database = agent_database;
            }
            if let Some(agent_schema) = agent.agent_schema {
                self.agent.agent_schema = agent_schema;
            }
            if let Some(functions_database) = agent.functions_database {
                self.agent.functions_database = functions_database;
            }
            if let Some(functions_schema) = agent.functions_schema {
                self.agent.functions_schema = functions_schema;
            }
            if let Some(warehouse) = agent.warehouse {
                self.agent.warehouse = warehouse;
            }
            if let Some(timeout_secs) = agent.timeout_secs {
                self.agent.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PROSPECTOR_DISCOVERY_BASE_URL") {
            self.discovery.base_url = value;
        }
        if let Some(value) = read_env("PROSPECTOR_DISCOVERY_API_KEY") {
            self.discovery.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PROSPECTOR_DISCOVERY_TIMEOUT_SECS") {
            self.discovery.timeout_secs = parse_u64("PROSPECTOR_DISCOVERY_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PROSPECTOR_DISCOVERY_BETA_HEADER") {
            self.discovery.beta_header = value;
        }

        if let Some(value) = read_env("PROSPECTOR_SEARCH_API_URL") {
            self.search.api_url = value;
        }
        if let Some(value) = read_env("PROSPECTOR_SEARCH_API_KEY") {
            self.search.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PROSPECTOR_SEARCH_MODEL") {
            self.search.model = value;
        }
        if let Some(value) = read_env("PROSPECTOR_SEARCH_MAX_TOKENS") {
            self.search.max_tokens = parse_u32("PROSPECTOR_SEARCH_MAX_TOKENS", &value)?;
        }
        if let Some(value) = read_env("PROSPECTOR_SEARCH_TIMEOUT_SECS") {
            self.search.timeout_secs = parse_u64("PROSPECTOR_SEARCH_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PROSPECTOR_AGENT_ACCOUNT_URL") {
            self.agent.account_url = Some(value);
        }
        if let Some(value) = read_env("PROSPECTOR_AGENT_ACCESS_TOKEN") {
            self.agent.access_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("PROSPECTOR_AGENT_ROLE") {
            self.agent.role = value;
        }
        if let Some(value) = read_env("PROSPECTOR_AGENT_DATABASE") {
            self.agent.agent_database = value;
        }
        if let Some(value) = read_env("PROSPECTOR_AGENT_SCHEMA") {
            self.agent.agent_schema = value;
        }
        if let Some(value) = read_env("PROSPECTOR_AGENT_FUNCTIONS_DATABASE") {
            self.agent.functions_database = value;
        }
        if let Some(value) = read_env("PROSPECTOR_AGENT_FUNCTIONS_SCHEMA") {
            self.agent.functions_schema = value;
        }
        if let Some(value) = read_env("PROSPECTOR_AGENT_WAREHOUSE") {
            self.agent.warehouse = value;
        }
        if let Some(value) = read_env("PROSPECTOR_AGENT_TIMEOUT_SECS") {
            self.agent.timeout_secs = parse_u64("PROSPECTOR_AGENT_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("PROSPECTOR_LOGGING_LEVEL").or_else(|| read_env("PROSPECTOR_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PROSPECTOR_LOGGING_FORMAT").or_else(|| read_env("PROSPECTOR_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(discovery_base_url) = overrides.discovery_base_url {
            self.discovery.base_url = discovery_base_url;
        }
        if let Some(discovery_api_key) = overrides.discovery_api_key {
            self.discovery.api_key = Some(secret_value(discovery_api_key));
        }
        if let Some(search_api_key) = overrides.search_api_key {
            self.search.api_key = Some(secret_value(search_api_key));
        }
        if let Some(agent_account_url) = overrides.agent_account_url {
            self.agent.account_url = Some(agent_account_url);
        }
        if let Some(agent_access_token) = overrides.agent_access_token {
            self.agent.access_token = Some(secret_value(agent_access_token));
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_discovery(&self.discovery)?;
        validate_search(&self.search)?;
        validate_agent(&self.agent)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("prospector.toml"), PathBuf::from("config/prospector.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_url(field: &str, url: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn validate_timeout(field: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 600 {
        return Err(ConfigError::Validation(format!("{field} must be in range 1..=600")));
    }
    Ok(())
}

fn validate_discovery(discovery: &DiscoveryConfig) -> Result<(), ConfigError> {
    validate_url("discovery.base_url", discovery.base_url.trim())?;
    validate_timeout("discovery.timeout_secs", discovery.timeout_secs)?;

    if let Some(api_key) = &discovery.api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "discovery.api_key must not be blank when set".to_string(),
            ));
        }
    }

    if discovery.beta_header.trim().is_empty() {
        return Err(ConfigError::Validation(
            "discovery.beta_header must not be blank (the run API requires the beta opt-in header)"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    validate_url("search.api_url", search.api_url.trim())?;
    validate_timeout("search.timeout_secs", search.timeout_secs)?;

    if search.model.trim().is_empty() {
        return Err(ConfigError::Validation("search.model must not be blank".to_string()));
    }
    if search.max_tokens == 0 {
        return Err(ConfigError::Validation(
            "search.max_tokens must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_agent(agent: &AgentRuntimeConfig) -> Result<(), ConfigError> {
    if let Some(account_url) = &agent.account_url {
        validate_url("agent.account_url", account_url.trim())?;
    }
    validate_timeout("agent.timeout_secs", agent.timeout_secs)?;

    for (field, value) in [
        ("agent.role", &agent.role),
        ("agent.agent_database", &agent.agent_database),
        ("agent.agent_schema", &agent.agent_schema),
        ("agent.functions_database", &agent.functions_database),
        ("agent.functions_schema", &agent.functions_schema),
        ("agent.warehouse", &agent.warehouse),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{field} must not be blank")));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    discovery: Option<DiscoveryPatch>,
    search: Option<SearchPatch>,
    agent: Option<AgentPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscoveryPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    beta_header: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    api_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentPatch {
    account_url: Option<String>,
    access_token: Option<String>,
    role: Option<String>,
    agent_database: Option<String>,
    agent_schema: Option<String>,
    functions_database: Option<String>,
    functions_schema: Option<String>,
    warehouse: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
