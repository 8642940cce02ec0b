//! OpenAI-compatible chat-completions client
//!
//! The client sends the suggestion system prompt plus the serialized failure
//! payload to `{base_url}/chat/completions` with bearer authentication and
//! returns the first choice's content. Transient failures are retried with
//! exponential backoff before the error is handed back.

mod models;
pub use models::*;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;

use correlation_engine_rs::suggestion::SYSTEM_PROMPT;
use correlation_engine_rs::SuggestionPayload;

use crate::collaborator::ReasoningCollaborator;
use crate::config::{ConfigProvider, ReasoningConfig, ServiceConfig, DEFAULT_PROVIDER};
use crate::error::{ErrorContext, Result, ServiceError};
use crate::resilience::{RetryConfig, RetryExecutor};
use crate::services::common::{build_http_client, parse_error_response, UserAgent};
use crate::util::{generate_request_id, sanitize_for_logging, truncate_string};

const SERVICE_NAME: &str = "openai";
const COMPLETIONS_ENDPOINT: &str = "chat/completions";

/// Chat-completions client implementing `ReasoningCollaborator`
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    http_client: Client,
    config: ReasoningConfig,
    retry: RetryExecutor,
}

impl OpenAIClient {
    /// Create a client from a validated configuration
    pub fn new(config: ReasoningConfig) -> Result<Self> {
        let retry = RetryExecutor::new(RetryConfig::from(&config));
        Self::with_retry(config, retry)
    }

    fn with_retry(config: ReasoningConfig, retry: RetryExecutor) -> Result<Self> {
        config.validate()?;

        let http_client = build_http_client(
            Some(UserAgent {
                extra: Some("chat-completions".to_string()),
                ..UserAgent::default()
            }),
            config.timeout(),
        )?;

        Ok(Self {
            http_client,
            config,
            retry,
        })
    }

    /// Create a new builder for the client
    pub fn builder() -> OpenAIClientBuilder {
        OpenAIClientBuilder::default()
    }

    /// The active configuration
    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    /// Build the chat request for one failure payload
    pub fn build_request(&self, payload: &SuggestionPayload) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(payload.to_message()),
            ],
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            ..Default::default()
        }
    }

    /// Send a chat completion request with retries
    pub async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        self.retry.execute(|| self.send_once(request)).await
    }

    async fn send_once(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = self.config.completions_url();
        let request_id = generate_request_id();
        debug!("Sending request to {}: POST {} ({})", SERVICE_NAME, url, request_id);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("X-Request-Id", &request_id)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                ServiceError::from(e).with_context(
                    ErrorContext::for_service(SERVICE_NAME)
                        .endpoint(COMPLETIONS_ENDPOINT)
                        .request_id(&request_id),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(SERVICE_NAME, COMPLETIONS_ENDPOINT, &request_id, response).await);
        }

        response.json::<ChatCompletionResponse>().await.map_err(|e| {
            ServiceError::parsing(format!("Failed to parse completion response: {}", e)).with_context(
                ErrorContext::for_service(SERVICE_NAME)
                    .status_code(status.as_u16())
                    .request_id(&request_id),
            )
        })
    }
}

#[async_trait]
impl ReasoningCollaborator for OpenAIClient {
    async fn analyze(&self, payload: &SuggestionPayload) -> Result<String> {
        let request = self.build_request(payload);
        debug!(
            "Collaborator payload: {}",
            truncate_string(&sanitize_for_logging(&payload.to_message()), 512)
        );

        let response = self.chat_completion(&request).await?;
        if let Some(usage) = &response.usage {
            info!(
                "Completion {} used {} tokens ({} prompt, {} completion)",
                response.id, usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
            );
        }

        match response.first_content() {
            Some(content) if !content.trim().is_empty() => Ok(content.to_string()),
            Some(_) => Err(ServiceError::parsing("Empty completion response")),
            None => Err(ServiceError::parsing("No completion choices returned")),
        }
    }
}

/// Builder for the chat-completions client
///
/// Starts from an explicit configuration or the environment, applies the
/// overrides on top and validates the result once.
#[derive(Debug, Default)]
pub struct OpenAIClientBuilder {
    config: Option<ReasoningConfig>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_seconds: Option<u64>,
    retry_config: Option<RetryConfig>,
}

impl OpenAIClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an explicit configuration instead of the environment
    pub fn config(mut self, config: ReasoningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the timeout in seconds
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Set retry configuration
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry_config = Some(config);
        self
    }

    /// Build the client, reading unset values from the environment
    pub fn build(self) -> Result<OpenAIClient> {
        self.build_from(&**DEFAULT_PROVIDER)
    }

    /// Build the client, reading unset values from `provider`
    pub fn build_from<P: ConfigProvider + ?Sized>(self, provider: &P) -> Result<OpenAIClient> {
        let mut config = match self.config {
            Some(config) => config,
            None => ReasoningConfig::load_unvalidated(provider)?,
        };

        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(model) = self.model {
            config.model = model;
        }

        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }

        let retry = RetryExecutor::new(self.retry_config.unwrap_or_else(|| RetryConfig::from(&config)));
        OpenAIClient::with_retry(config, retry)
    }
}
