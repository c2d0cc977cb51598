//! Assistant capability: the upstream that turns a prompt into a response
//!
//! Provides an `AssistantBackend` trait with one HTTP implementation:
//! - **HttpAssistant**: OpenAI-compatible `/chat/completions` endpoint
//!
//! Backends are stateless. Conversation history is owned by the caller and
//! passed in on every call.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;

use crate::config::AssistantConfig;
use crate::models::ChatMessage;

// ============================================================================
// AssistantBackend trait
// ============================================================================

/// Abstraction over assistant providers.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Produce a response to `prompt`, given the prior turns of the conversation.
    async fn respond(&self, prompt: &str, history: &[ChatMessage])
        -> Result<String, AssistantError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Assistant returned no message content")]
    EmptyResponse,

    #[error("Missing API key")]
    MissingApiKey,

    #[error("All {attempts} retry attempts failed: {last}")]
    RetryExhausted { attempts: usize, last: String },
}

impl AssistantError {
    /// Failures worth another attempt: transport errors, rate limits and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            AssistantError::Http(_) => true,
            AssistantError::Api { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

// ============================================================================
// Chat completions wire structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// HttpAssistant
// ============================================================================

/// OpenAI-compatible chat completions client.
#[derive(Debug, Clone)]
pub struct HttpAssistant {
    client: Client,
    config: AssistantConfig,
    base_url: String,
}

impl HttpAssistant {
    pub fn new(config: AssistantConfig) -> Result<Self, AssistantError> {
        let base_url = config.api_url.clone();
        Self::with_base_url(config, base_url)
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(
        config: AssistantConfig,
        base_url: String,
    ) -> Result<Self, AssistantError> {
        if config.api_key.trim().is_empty() {
            return Err(AssistantError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn complete_once(
        &self,
        prompt: &ChatMessage,
        history: &[ChatMessage],
    ) -> Result<String, AssistantError> {
        let url = format!("{}/chat/completions", self.base_url);

        let system = ChatMessage::system(self.config.system_prompt.clone());
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(&system);
        messages.extend(history.iter());
        messages.push(prompt);

        let request = CompletionRequest {
            model: &self.config.model,
            messages,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);

            tracing::error!(code = status.as_u16(), message = %message, "Assistant API error");

            return Err(AssistantError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AssistantError::EmptyResponse)
    }
}

#[async_trait]
impl AssistantBackend for HttpAssistant {
    async fn respond(
        &self,
        prompt: &str,
        history: &[ChatMessage],
    ) -> Result<String, AssistantError> {
        let prompt = ChatMessage::user(prompt);
        let retry_strategy = ExponentialBackoff::from_millis(self.config.retry_delay_ms)
            .max_delay(Duration::from_secs(10))
            .map(jitter)
            .take(self.config.max_retries);

        let result = RetryIf::spawn(
            retry_strategy,
            || self.complete_once(&prompt, history),
            AssistantError::is_transient,
        )
        .await;

        match result {
            Ok(text) => Ok(text),
            Err(e) if self.config.max_retries == 0 || !e.is_transient() => Err(e),
            Err(e) => {
                let attempts = self.config.max_retries + 1;
                tracing::error!(
                    attempts = attempts,
                    error = %e,
                    "All assistant retry attempts failed"
                );
                Err(AssistantError::RetryExhausted {
                    attempts,
                    last: e.to_string(),
                })
            }
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ============================================================================
// TESTS
// ============================================================================
