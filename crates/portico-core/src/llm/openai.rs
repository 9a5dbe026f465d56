//! OpenAI chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{ChatMessage, ChatModel, CompletionRequest, ToolChoice, ToolDefinition};
use crate::config::OpenAiConfig;
use crate::error::{ProviderError, ServiceError};
use crate::retry::RetryPolicy;
use crate::store::ParameterStore;

const USER_AGENT: &str = concat!("portico/", env!("CARGO_PKG_VERSION"));

pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, config: &OpenAiConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ServiceError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
            retry: config.retry_policy(),
        })
    }

    /// Reads the API key from the configured parameter and builds the client.
    pub async fn from_parameter_store(
        params: &dyn ParameterStore,
        config: &OpenAiConfig,
    ) -> Result<Self, ServiceError> {
        let name = config.api_key_parameter()?;
        let api_key = params
            .parameter(name)
            .await
            .map_err(|e| ServiceError::dependency("parameters", e.to_string()))?;
        info!(event = "model.client_ready", model = %config.model, "model client initialized");
        Self::new(api_key, config)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn complete_once(&self, body: &WireRequest<'_>) -> Result<ChatMessage, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: error_message(&message),
            });
        }

        let json: Value = response.json().await.map_err(|e| ProviderError::InvalidResponse {
            message: format!("response body is not JSON: {e}"),
        })?;

        let message = json
            .pointer("/choices/0/message")
            .cloned()
            .ok_or_else(|| ProviderError::InvalidResponse {
                message: "response has no choices[0].message".to_string(),
            })?;

        serde_json::from_value(message).map_err(|e| ProviderError::InvalidResponse {
            message: format!("unexpected message shape: {e}"),
        })
    }
}

/// Pulls `error.message` out of an OpenAI error body, else the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(500).collect())
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, ProviderError> {
        let body = WireRequest {
            model: &self.model,
            messages: &request.messages,
            tools: &request.tools,
            tool_choice: (!request.tools.is_empty()).then_some(request.tool_choice),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "chat completion request"
        );

        self.retry
            .run("openai.chat_completions", || self.complete_once(&body))
            .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
