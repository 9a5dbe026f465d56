//! Error types.
//!
//! [`ServiceError`] is what route handlers see and map to HTTP status codes.
//! Store and provider failures have their own enums so the retry layer and
//! the logs keep the detail; both collapse into
//! [`ServiceError::Dependency`] at the component boundary.

use std::time::Duration;

/// Error surfaced by a component operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Missing or malformed input. The message is returned to the caller.
    #[error("{0}")]
    Validation(String),

    /// Credential mismatch. Never says which field was wrong.
    #[error("invalid credentials")]
    Authentication,

    /// A secret store, parameter store, table, model or search call failed.
    #[error("{service} failure: {message}")]
    Dependency {
        service: &'static str,
        message: String,
    },

    /// A required environment value is absent or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn dependency(service: &'static str, message: impl Into<String>) -> Self {
        Self::Dependency {
            service,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Authentication => 401,
            Self::Dependency { .. } | Self::Configuration(_) => 500,
        }
    }

    /// Message safe to put in a response body.
    pub fn public_message(&self) -> &str {
        match self {
            Self::Validation(message) => message,
            Self::Authentication => "Invalid credentials",
            Self::Dependency { .. } | Self::Configuration(_) => "Internal server error",
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

/// Secret store, parameter store or table failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The named secret or parameter does not exist.
    #[error("not found: {name}")]
    NotFound { name: String },

    /// The entry exists but holds no string value.
    #[error("empty value: {name}")]
    Empty { name: String },

    /// The backend call itself failed.
    #[error("store backend error: {message}")]
    Backend { message: String },
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::dependency("store", err.to_string())
    }
}

/// Model or search provider failure.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Connection, timeout or body-read failure.
    #[error("network error: {message}")]
    Network { message: String, transient: bool },

    /// 429 from the provider.
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The provider answered 2xx but the payload is not what we expect.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

impl ProviderError {
    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { transient, .. } => *transient,
            Self::RateLimited { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::InvalidResponse { .. } => false,
        }
    }

    /// Server-provided wait before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    pub fn into_service_error(self, service: &'static str) -> ServiceError {
        ServiceError::dependency(service, self.to_string())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            transient: err.is_connect() || err.is_timeout(),
            message: err.to_string(),
        }
    }
}

/// Result type for component operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
