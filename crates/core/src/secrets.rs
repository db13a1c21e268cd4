//! Secret injection for remote clients.
//!
//! Clients never reach into ambient state (environment, globals) for
//! credentials. They receive a `SecretProvider` at construction and ask
//! it for secrets by name.

use std::collections::HashMap;

use secrecy::SecretString;
use thiserror::Error;

/// Well-known secret names used across the workspace.
pub const DISCOVERY_API_KEY: &str = "discovery_api_key";
pub const SEARCH_API_KEY: &str = "search_api_key";
pub const AGENT_ACCESS_TOKEN: &str = "agent_access_token";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("secret `{0}` is not configured")]
    Missing(String),
}

pub trait SecretProvider: Send + Sync {
    fn secret(&self, name: &str) -> Result<SecretString, SecretError>;
}

/// In-memory provider. The CLI wires one up from the loaded config;
/// tests populate it directly.
#[derive(Default)]
pub struct StaticSecretProvider {
    secrets: HashMap<String, SecretString>,
}

impl StaticSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: &str, value: impl Into<SecretString>) -> Self {
        self.secrets.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<SecretString>) {
        self.secrets.insert(name.to_string(), value.into());
    }
}

impl SecretProvider for StaticSecretProvider {
    fn secret(&self, name: &str) -> Result<SecretString, SecretError> {
        self.secrets.get(name).cloned().ok_or_else(|| SecretError::Missing(name.to_string()))
    }
}

/// Resolves each secret name through an explicit name-to-variable map.
/// Unmapped names are missing even if a same-named variable exists; the
/// mapping is the whole contract.
#[derive(Default)]
pub struct EnvSecretProvider {
    vars: HashMap<String, String>,
}

impl EnvSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping(mut self, name: &str, env_var: impl Into<String>) -> Self {
        self.vars.insert(name.to_string(), env_var.into());
        self
    }
}

impl SecretProvider for EnvSecretProvider {
    fn secret(&self, name: &str) -> Result<SecretString, SecretError> {
        let env_var = self.vars.get(name).ok_or_else(|| SecretError::Missing(name.to_string()))?;
        match std::env::var(env_var) {
            Ok(value) if !value.trim().is_empty() => Ok(value.into()),
            _ => Err(SecretError::Missing(name.to_string())),
        }
    }
}
