use std::sync::Arc;
use std::time::Duration;

use prospector_core::config::SearchConfig;
use prospector_core::http::{ApiRequest, HttpTransport, Method, TransportError};
use prospector_core::secrets::{SecretError, SecretProvider, SEARCH_API_KEY};
use prospector_core::ToolEnvelope;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::types::{SearchAnswer, SearchRequest};

pub const WEB_SEARCH: &str = "web_search";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SearchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error("remote service rejected the request: HTTP {status}: {body}")]
    Remote { status: u16, body: String },
    #[error("could not decode response body: {message}")]
    Decode { message: String },
}

impl SearchError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Transport(_) | Self::Decode { .. } => "transport",
            Self::Secret(_) => "configuration",
            Self::Remote { .. } => "remote_rejected",
        }
    }
}

#[derive(Clone)]
pub struct SearchClient {
    transport: Arc<dyn HttpTransport>,
    secrets: Arc<dyn SecretProvider>,
    config: SearchConfig,
}

impl SearchClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        secrets: Arc<dyn SecretProvider>,
        config: SearchConfig,
    ) -> Self {
        Self { transport, secrets, config }
    }

    pub async fn web_search(&self, request: SearchRequest) -> Result<SearchAnswer, SearchError> {
        let api_key = self.secrets.secret(SEARCH_API_KEY)?;
        let model = request.model.clone().unwrap_or_else(|| self.config.model.clone());
        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);

        let payload = json!({
            "model": model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "max_tokens": max_tokens,
            "temperature": 0,
            "return_citations": request.return_citations,
            "return_images": false,
            "return_related_questions": request.return_related_questions,
        });

        let api_request = ApiRequest::new(
            Method::Post,
            self.config.api_url.clone(),
            Duration::from_secs(self.config.timeout_secs),
        )
        .with_header("authorization", format!("Bearer {}", api_key.expose_secret()))
        .with_header("content-type", "application/json")
        .with_json_body(payload);

        debug!(event_name = "search.request", model = %model, "issuing web search");
        let response = self.transport.execute(api_request).await?;

        if !response.is_success() {
            return Err(SearchError::Remote { status: response.status, body: response.body });
        }

        let wire: CompletionWire = serde_json::from_str(&response.body)
            .map_err(|error| SearchError::Decode { message: error.to_string() })?;

        let content = wire
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(SearchAnswer {
            prompt: request.prompt,
            model_used: model,
            content,
            citations: wire.citations,
            related_questions: wire.related_questions,
            usage: wire.usage,
        })
    }

    /// Envelope boundary used by the agent tool layer.
    pub async fn web_search_envelope(&self, request: SearchRequest) -> ToolEnvelope {
        let prompt = request.prompt.clone();
        match self.web_search(request).await {
            Ok(answer) => ToolEnvelope::success(WEB_SEARCH, answer),
            Err(error) => ToolEnvelope::failure(WEB_SEARCH, error.error_class(), error.to_string())
                .with_context("prompt", prompt),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionWire {
    #[serde(default)]
    choices: Vec<ChoiceWire>,
    #[serde(default)]
    citations: Vec<String>,
    #[serde(default)]
    related_questions: Vec<String>,
    #[serde(default)]
    usage: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ChoiceWire {
    message: MessageWire,
}

#[derive(Debug, Deserialize)]
struct MessageWire {
    #[serde(default)]
    content: String,
}
