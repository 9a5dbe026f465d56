use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use tracing::debug;

use super::{FeatureRequest, FeatureRequestStore};
use crate::error::StoreError;

/// [`FeatureRequestStore`] writing one item per request with `PutItem`.
#[derive(Debug, Clone)]
pub struct DynamoFeatureRequestStore {
    client: aws_sdk_dynamodb::Client,
    table_name: String,
}

impl DynamoFeatureRequestStore {
    pub fn new(client: aws_sdk_dynamodb::Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

fn string_or_null(value: Option<&str>) -> AttributeValue {
    match value {
        Some(value) => AttributeValue::S(value.to_string()),
        None => AttributeValue::Null(true),
    }
}

/// Item attributes, named as in the JSON form of the record.
pub fn to_item(request: &FeatureRequest) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("id".to_string(), AttributeValue::S(request.id.clone())),
        ("title".to_string(), AttributeValue::S(request.title.clone())),
        (
            "description".to_string(),
            AttributeValue::S(request.description.clone()),
        ),
        (
            "requesterEmail".to_string(),
            string_or_null(request.requester_email.as_deref()),
        ),
        ("status".to_string(), AttributeValue::S(request.status.clone())),
        (
            "createdAt".to_string(),
            AttributeValue::S(request.created_at.clone()),
        ),
        (
            "updatedAt".to_string(),
            AttributeValue::S(request.updated_at.clone()),
        ),
    ])
}

#[async_trait]
impl FeatureRequestStore for DynamoFeatureRequestStore {
    async fn put(&self, request: &FeatureRequest) -> Result<(), StoreError> {
        debug!(table = %self.table_name, id = %request.id, "putting feature request");

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_item(request)))
            .send()
            .await
            .map_err(|err| StoreError::Backend {
                message: DisplayErrorContext(&err).to_string(),
            })?;
        Ok(())
    }
}
