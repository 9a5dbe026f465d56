//! Per-instance state shared by every invocation.
//!
//! Built once at cold start. The model and search clients need secrets from
//! the parameter store, so they are created on first use and cached; a
//! failed creation is retried by the next request.

use std::sync::Arc;

use portico_core::feature_request::DynamoFeatureRequestStore;
use portico_core::llm::OpenAiClient;
use portico_core::search::GoogleSearch;
use portico_core::store::{SecretsManagerStore, SsmParameterStore};
use portico_core::{
    AppConfig, ChatModel, CredentialGate, FeatureRequestService, FeatureRequestStore,
    ParameterStore, SearchOrchestrator, SecretStore, ServiceError, WebSearch,
};
use tokio::sync::OnceCell;
use tracing::warn;

pub struct AppState {
    config: AppConfig,
    gate: CredentialGate,
    params: Arc<dyn ParameterStore>,
    model: OnceCell<Arc<dyn ChatModel>>,
    search: OnceCell<Arc<dyn WebSearch>>,
    feature_requests: Option<FeatureRequestService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("model_ready", &self.model.initialized())
            .field("search_ready", &self.search.initialized())
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        config: AppConfig,
        secrets: Arc<dyn SecretStore>,
        params: Arc<dyn ParameterStore>,
        feature_store: Option<Arc<dyn FeatureRequestStore>>,
    ) -> Self {
        Self {
            gate: CredentialGate::new(secrets, config.gate.clone()),
            config,
            params,
            model: OnceCell::new(),
            search: OnceCell::new(),
            feature_requests: feature_store.map(FeatureRequestService::new),
        }
    }

    /// AWS-backed stores built from one SDK config.
    pub fn from_sdk_config(sdk_config: &aws_config::SdkConfig, config: AppConfig) -> Self {
        let secrets = Arc::new(SecretsManagerStore::new(
            aws_sdk_secretsmanager::Client::new(sdk_config),
        ));
        let params = Arc::new(SsmParameterStore::new(aws_sdk_ssm::Client::new(sdk_config)));
        let feature_store = config.feature_requests.table_name.as_deref().map(|table| {
            Arc::new(DynamoFeatureRequestStore::new(
                aws_sdk_dynamodb::Client::new(sdk_config),
                table,
            )) as Arc<dyn FeatureRequestStore>
        });

        Self::new(config, secrets, params, feature_store)
    }

    /// Uses `model` instead of building an OpenAI client.
    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = OnceCell::new_with(Some(model));
        self
    }

    /// Uses `search` instead of building a Google client.
    pub fn with_search(mut self, search: Arc<dyn WebSearch>) -> Self {
        self.search = OnceCell::new_with(Some(search));
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn gate(&self) -> &CredentialGate {
        &self.gate
    }

    pub async fn model(&self) -> Result<Arc<dyn ChatModel>, ServiceError> {
        self.model
            .get_or_try_init(|| async {
                let client =
                    OpenAiClient::from_parameter_store(self.params.as_ref(), &self.config.openai)
                        .await
                        .inspect_err(|e| warn!(event = "model.init_failed", error = %e))?;
                Ok::<_, ServiceError>(Arc::new(client) as Arc<dyn ChatModel>)
            })
            .await
            .cloned()
    }

    pub async fn search(&self) -> Result<Arc<dyn WebSearch>, ServiceError> {
        self.search
            .get_or_try_init(|| async {
                let client =
                    GoogleSearch::from_parameter_store(self.params.as_ref(), &self.config.search)
                        .await
                        .inspect_err(|e| warn!(event = "search.init_failed", error = %e))?;
                Ok::<_, ServiceError>(Arc::new(client) as Arc<dyn WebSearch>)
            })
            .await
            .cloned()
    }

    /// Model and search client are initialized concurrently.
    pub async fn orchestrator(&self) -> Result<SearchOrchestrator, ServiceError> {
        let (model, search) = tokio::try_join!(self.model(), self.search())?;
        Ok(SearchOrchestrator::new(model, search).with_tool_choice(self.config.search.tool_choice))
    }

    pub fn feature_requests(&self) -> Result<&FeatureRequestService, ServiceError> {
        self.feature_requests.as_ref().ok_or_else(|| {
            ServiceError::configuration("FEATURE_REQUEST_TABLE_NAME is not set")
        })
    }
}
