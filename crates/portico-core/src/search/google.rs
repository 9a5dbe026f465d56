//! Google Custom Search JSON API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use serde_json::Value;
use tracing::{debug, info};

use super::{WebSearch, RESULT_COUNT};
use crate::config::SearchConfig;
use crate::error::{ProviderError, ServiceError};
use crate::retry::RetryPolicy;
use crate::store::ParameterStore;

const USER_AGENT: &str = concat!("portico/", env!("CARGO_PKG_VERSION"));

pub struct GoogleSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    engine_id: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for GoogleSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSearch")
            .field("base_url", &self.base_url)
            .field("engine_id", &self.engine_id)
            .finish_non_exhaustive()
    }
}

impl GoogleSearch {
    pub fn new(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        config: &SearchConfig,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ServiceError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            retry: config.retry_policy(),
        })
    }

    /// Fetches the API key and engine id concurrently, then builds the client.
    pub async fn from_parameter_store(
        params: &dyn ParameterStore,
        config: &SearchConfig,
    ) -> Result<Self, ServiceError> {
        let (key_name, cx_name) = config.parameter_names()?;
        let (api_key, engine_id) =
            tokio::try_join!(params.parameter(key_name), params.parameter(cx_name))
                .map_err(|e| ServiceError::dependency("parameters", e.to_string()))?;
        info!(event = "search.client_ready", "search client initialized");
        Self::new(api_key, engine_id, config)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn search_once(&self, query: &str) -> Result<Vec<Value>, ProviderError> {
        let num = RESULT_COUNT.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::from(e.without_url()))?;

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
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| status.to_string());
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse {
                message: format!("search response is not JSON: {}", e.without_url()),
            })?;

        Ok(items(json))
    }
}

/// The `items` array, or empty when the provider found nothing.
fn items(mut json: Value) -> Vec<Value> {
    match json.get_mut("items").map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

#[async_trait]
impl WebSearch for GoogleSearch {
    async fn search(&self, query: &str) -> Result<Vec<Value>, ProviderError> {
        let results = self
            .retry
            .run("google.custom_search", || self.search_once(query))
            .await?;
        debug!(event = "search.completed", results = results.len());
        Ok(results)
    }
}
