//! Feature request intake.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ServiceError, StoreError};

pub mod dynamo;

pub use dynamo::DynamoFeatureRequestStore;

pub const DEFAULT_STATUS: &str = "PENDING";

/// Stored record, also the `201` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRequest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub requester_email: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Client-supplied fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeatureRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requester_email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl NewFeatureRequest {
    pub fn from_body(body: Option<&str>) -> Result<Self, ServiceError> {
        let body = body
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| ServiceError::validation("Request body is required"))?;
        serde_json::from_str(body)
            .map_err(|_| ServiceError::validation("Invalid JSON in request body"))
    }

    /// Fills id, default status and timestamps. Title and description must be non-blank.
    pub fn into_record(self, now: chrono::DateTime<Utc>) -> Result<FeatureRequest, ServiceError> {
        let (Some(title), Some(description)) = (present(self.title), present(self.description))
        else {
            return Err(ServiceError::validation(
                "Title and description are required",
            ));
        };

        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        Ok(FeatureRequest {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            requester_email: present(self.requester_email),
            status: present(self.status).unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            created_at: timestamp.clone(),
            updated_at: timestamp,
        })
    }
}

/// Where feature requests are written.
#[async_trait]
pub trait FeatureRequestStore: Send + Sync {
    async fn put(&self, request: &FeatureRequest) -> Result<(), StoreError>;
}

/// Keeps records in memory. Used in tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryFeatureRequestStore {
    records: Mutex<Vec<FeatureRequest>>,
}

impl InMemoryFeatureRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<FeatureRequest> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl FeatureRequestStore for InMemoryFeatureRequestStore {
    async fn put(&self, request: &FeatureRequest) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Backend {
            message: "in-memory store poisoned".to_string(),
        })?;
        records.push(request.clone());
        Ok(())
    }
}

pub struct FeatureRequestService {
    store: Arc<dyn FeatureRequestStore>,
}

impl std::fmt::Debug for FeatureRequestService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureRequestService").finish_non_exhaustive()
    }
}

impl FeatureRequestService {
    pub fn new(store: Arc<dyn FeatureRequestStore>) -> Self {
        Self { store }
    }

    /// Validates the body, stores one record and returns it.
    pub async fn submit(&self, body: Option<&str>) -> Result<FeatureRequest, ServiceError> {
        let record = NewFeatureRequest::from_body(body)?.into_record(Utc::now())?;

        self.store.put(&record).await.map_err(|e| {
            warn!(event = "feature_request.store_failed", id = %record.id, error = %e);
            ServiceError::dependency("table", e.to_string())
        })?;

        info!(
            event = "feature_request.created",
            id = %record.id,
            status = %record.status,
            "feature request stored"
        );
        Ok(record)
    }
}
