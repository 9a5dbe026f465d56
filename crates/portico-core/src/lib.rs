//! Core logic for the portico API.
//!
//! This crate holds everything behind the HTTP routes:
//!
//! - [`auth::CredentialGate`]: issues and checks CloudFront signed cookies
//!   after a username/password check against a secret store
//! - [`orchestrator::SearchOrchestrator`]: lets the model decide whether a
//!   web search is needed, runs at most one, and returns the final answer
//! - [`chat::ChatService`]: plain chat completion
//! - [`feature_request::FeatureRequestService`]: validated feature request intake
//!
//! External services sit behind traits ([`store::SecretStore`],
//! [`store::ParameterStore`], [`llm::ChatModel`], [`search::WebSearch`],
//! [`feature_request::FeatureRequestStore`]) with AWS / HTTP implementations
//! and in-memory ones for tests.
//!
//! # Configuration
//!
//! See [`config::AppConfig::from_env`] for the full list of environment
//! variables. Only names of secrets and parameters come from the environment,
//! never the secret values themselves.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod feature_request;
pub mod llm;
pub mod orchestrator;
pub mod retry;
pub mod search;
pub mod store;

pub use auth::{
    CookieJar, Credential, CredentialGate, IssuedCookies, SecretRecord, SignedCookieSet,
};
pub use chat::ChatService;
pub use config::{AppConfig, FeatureRequestConfig, GateConfig, OpenAiConfig, SearchConfig};
pub use error::{ProviderError, ServiceError, ServiceResult, StoreError};
pub use feature_request::{
    FeatureRequest, FeatureRequestService, FeatureRequestStore, InMemoryFeatureRequestStore,
    NewFeatureRequest,
};
pub use llm::{parse_conversation, ChatMessage, ChatModel, Role, ToolChoice};
pub use orchestrator::SearchOrchestrator;
pub use retry::RetryPolicy;
pub use search::WebSearch;
pub use store::{ParameterStore, SecretStore, StaticStore};
