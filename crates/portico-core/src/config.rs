//! Environment configuration.
//!
//! Only lookup keys (secret names, parameter names, table names) come from the
//! environment. Values that a route needs but cannot find are reported by
//! [`AppConfig::missing`] at startup and surface as a configuration error on
//! that route only.

use std::env;
use std::time::Duration;

use crate::error::ServiceError;
use crate::llm::ToolChoice;
use crate::retry::RetryPolicy;

fn default_cookie_resource() -> String {
    "*".to_string()
}

fn default_cookie_ttl() -> i64 {
    3600
}

/// Longest accepted cookie lifetime, one year.
pub const MAX_COOKIE_TTL_SECS: i64 = 365 * 24 * 3600;

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_search_base_url() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn require<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, ServiceError> {
    value
        .as_deref()
        .ok_or_else(|| ServiceError::configuration(format!("{key} is not set")))
}

/// Credential gate settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Secret holding `{username, passwordHash}`.
    pub auth_secret_name: Option<String>,
    /// Secret holding the PEM private key used to sign policies.
    pub private_key_secret_name: Option<String>,
    /// Key-pair / key-group id echoed in the `CloudFront-Key-Pair-Id` cookie.
    pub key_pair_id: Option<String>,
    /// Resource pattern granted by the policy.
    pub resource: String,
    /// Cookie lifetime in seconds.
    pub ttl_secs: i64,
    /// Optional `Domain` attribute on the emitted cookies.
    pub cookie_domain: Option<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            auth_secret_name: None,
            private_key_secret_name: None,
            key_pair_id: None,
            resource: default_cookie_resource(),
            ttl_secs: default_cookie_ttl(),
            cookie_domain: None,
        }
    }
}

impl GateConfig {
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `AUTH_SECRET_NAME` | Secret with the username and password hash |
    /// | `PRIVATE_KEY_SECRET_NAME` | Secret with the signing key PEM |
    /// | `CLOUDFRONT_KEY_GROUP_ID` | Key-pair id placed in the cookies |
    /// | `SIGNED_COOKIE_RESOURCE` | Policy resource (default `*`) |
    /// | `SIGNED_COOKIE_TTL_SECS` | Lifetime (default 3600, at most one year) |
    /// | `SIGNED_COOKIE_DOMAIN` | Cookie `Domain` attribute |
    pub fn from_env() -> Self {
        Self {
            auth_secret_name: non_empty_var("AUTH_SECRET_NAME"),
            private_key_secret_name: non_empty_var("PRIVATE_KEY_SECRET_NAME"),
            key_pair_id: non_empty_var("CLOUDFRONT_KEY_GROUP_ID"),
            resource: non_empty_var("SIGNED_COOKIE_RESOURCE")
                .unwrap_or_else(default_cookie_resource),
            ttl_secs: parsed_var("SIGNED_COOKIE_TTL_SECS")
                .filter(|ttl: &i64| (1..=MAX_COOKIE_TTL_SECS).contains(ttl))
                .unwrap_or_else(default_cookie_ttl),
            cookie_domain: non_empty_var("SIGNED_COOKIE_DOMAIN"),
        }
    }

    pub fn with_auth_secret_name(mut self, name: impl Into<String>) -> Self {
        self.auth_secret_name = Some(name.into());
        self
    }

    pub fn with_private_key_secret_name(mut self, name: impl Into<String>) -> Self {
        self.private_key_secret_name = Some(name.into());
        self
    }

    pub fn with_key_pair_id(mut self, id: impl Into<String>) -> Self {
        self.key_pair_id = Some(id.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    pub fn with_ttl_secs(mut self, ttl_secs: i64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    pub fn auth_secret_name(&self) -> Result<&str, ServiceError> {
        require(&self.auth_secret_name, "AUTH_SECRET_NAME")
    }

    pub fn private_key_secret_name(&self) -> Result<&str, ServiceError> {
        require(&self.private_key_secret_name, "PRIVATE_KEY_SECRET_NAME")
    }

    pub fn key_pair_id(&self) -> Result<&str, ServiceError> {
        require(&self.key_pair_id, "CLOUDFRONT_KEY_GROUP_ID")
    }
}

/// Model provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    /// Parameter holding the API key.
    pub api_key_parameter: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum retries for transient failures.
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_parameter: None,
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl OpenAiConfig {
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `OPENAI_API_KEY_PARAMETER_NAME` | Parameter with the API key |
    /// | `OPENAI_BASE_URL` | API base (default `https://api.openai.com/v1`) |
    /// | `OPENAI_MODEL` | Model name (default `gpt-4o-mini`) |
    /// | `PROVIDER_TIMEOUT_SECS` | Request timeout (default 30) |
    /// | `PROVIDER_MAX_RETRIES` | Retries for transient failures (default 2) |
    pub fn from_env() -> Self {
        Self {
            api_key_parameter: non_empty_var("OPENAI_API_KEY_PARAMETER_NAME"),
            base_url: non_empty_var("OPENAI_BASE_URL").unwrap_or_else(default_openai_base_url),
            model: non_empty_var("OPENAI_MODEL").unwrap_or_else(default_openai_model),
            timeout_secs: parsed_var("PROVIDER_TIMEOUT_SECS").unwrap_or_else(default_timeout),
            max_retries: parsed_var("PROVIDER_MAX_RETRIES").unwrap_or_else(default_max_retries),
        }
    }

    pub fn with_api_key_parameter(mut self, name: impl Into<String>) -> Self {
        self.api_key_parameter = Some(name.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn api_key_parameter(&self) -> Result<&str, ServiceError> {
        require(&self.api_key_parameter, "OPENAI_API_KEY_PARAMETER_NAME")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_retries(self.max_retries)
    }
}

/// Web search settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub api_key_parameter: Option<String>,
    pub engine_id_parameter: Option<String>,
    pub base_url: String,
    /// Whether the first model turn must call the search tool.
    pub tool_choice: ToolChoice,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_parameter: None,
            engine_id_parameter: None,
            base_url: default_search_base_url(),
            tool_choice: ToolChoice::Auto,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl SearchConfig {
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `GOOGLE_API_KEY_PARAMETER_NAME` | Parameter with the search API key |
    /// | `GOOGLE_SEARCH_ENGINE_ID_PARAMETER_NAME` | Parameter with the engine id |
    /// | `GOOGLE_SEARCH_BASE_URL` | Search endpoint |
    /// | `SEARCH_TOOL_CHOICE` | `auto` (default) or `required` |
    pub fn from_env() -> Self {
        Self {
            api_key_parameter: non_empty_var("GOOGLE_API_KEY_PARAMETER_NAME"),
            engine_id_parameter: non_empty_var("GOOGLE_SEARCH_ENGINE_ID_PARAMETER_NAME"),
            base_url: non_empty_var("GOOGLE_SEARCH_BASE_URL")
                .unwrap_or_else(default_search_base_url),
            tool_choice: match non_empty_var("SEARCH_TOOL_CHOICE")
                .map(|v| v.to_lowercase())
                .as_deref()
            {
                Some("required") => ToolChoice::Required,
                _ => ToolChoice::Auto,
            },
            timeout_secs: parsed_var("PROVIDER_TIMEOUT_SECS").unwrap_or_else(default_timeout),
            max_retries: parsed_var("PROVIDER_MAX_RETRIES").unwrap_or_else(default_max_retries),
        }
    }

    pub fn with_api_key_parameter(mut self, name: impl Into<String>) -> Self {
        self.api_key_parameter = Some(name.into());
        self
    }

    pub fn with_engine_id_parameter(mut self, name: impl Into<String>) -> Self {
        self.engine_id_parameter = Some(name.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Both parameter names, or a configuration error naming the first missing one.
    pub fn parameter_names(&self) -> Result<(&str, &str), ServiceError> {
        Ok((
            require(&self.api_key_parameter, "GOOGLE_API_KEY_PARAMETER_NAME")?,
            require(
                &self.engine_id_parameter,
                "GOOGLE_SEARCH_ENGINE_ID_PARAMETER_NAME",
            )?,
        ))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default().with_max_retries(self.max_retries)
    }
}

/// Feature request table settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureRequestConfig {
    pub table_name: Option<String>,
}

impl FeatureRequestConfig {
    /// Reads `FEATURE_REQUEST_TABLE_NAME`.
    pub fn from_env() -> Self {
        Self {
            table_name: non_empty_var("FEATURE_REQUEST_TABLE_NAME"),
        }
    }

    pub fn table_name(&self) -> Result<&str, ServiceError> {
        require(&self.table_name, "FEATURE_REQUEST_TABLE_NAME")
    }
}

/// Everything the function reads from its environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub gate: GateConfig,
    pub openai: OpenAiConfig,
    pub search: SearchConfig,
    pub feature_requests: FeatureRequestConfig,
    /// Origin allowed on credentialed routes (`CORS_ALLOWED_ORIGIN`).
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            gate: GateConfig::from_env(),
            openai: OpenAiConfig::from_env(),
            search: SearchConfig::from_env(),
            feature_requests: FeatureRequestConfig::from_env(),
            cors_allowed_origin: non_empty_var("CORS_ALLOWED_ORIGIN"),
        }
    }

    /// Environment variables that some route needs but are unset.
    pub fn missing(&self) -> Vec<&'static str> {
        let checks = [
            ("AUTH_SECRET_NAME", self.gate.auth_secret_name.is_none()),
            (
                "PRIVATE_KEY_SECRET_NAME",
                self.gate.private_key_secret_name.is_none(),
            ),
            ("CLOUDFRONT_KEY_GROUP_ID", self.gate.key_pair_id.is_none()),
            (
                "OPENAI_API_KEY_PARAMETER_NAME",
                self.openai.api_key_parameter.is_none(),
            ),
            (
                "GOOGLE_API_KEY_PARAMETER_NAME",
                self.search.api_key_parameter.is_none(),
            ),
            (
                "GOOGLE_SEARCH_ENGINE_ID_PARAMETER_NAME",
                self.search.engine_id_parameter.is_none(),
            ),
            (
                "FEATURE_REQUEST_TABLE_NAME",
                self.feature_requests.table_name.is_none(),
            ),
        ];
        checks
            .into_iter()
            .filter_map(|(key, missing)| missing.then_some(key))
            .collect()
    }
}
