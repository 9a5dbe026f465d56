//! Secrets Manager and SSM Parameter Store backends.

use async_trait::async_trait;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, SdkError};
use tracing::debug;

use super::{ParameterStore, SecretStore};
use crate::error::StoreError;

/// [`SecretStore`] over AWS Secrets Manager.
#[derive(Debug, Clone)]
pub struct SecretsManagerStore {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerStore {
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn secret_string(&self, name: &str) -> Result<String, StoreError> {
        debug!(secret = name, "fetching secret");

        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError(ref service)
                    if service.err().is_resource_not_found_exception() =>
                {
                    StoreError::NotFound {
                        name: name.to_string(),
                    }
                }
                other => StoreError::Backend {
                    message: DisplayErrorContext(&other).to_string(),
                },
            })?;

        output
            .secret_string()
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| StoreError::Empty {
                name: name.to_string(),
            })
    }
}

/// [`ParameterStore`] over SSM Parameter Store, always with decryption.
#[derive(Debug, Clone)]
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    pub fn new(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn parameter(&self, name: &str) -> Result<String, StoreError> {
        debug!(parameter = name, "fetching parameter");

        let output = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|err| match err {
                aws_sdk_ssm::error::SdkError::ServiceError(ref service)
                    if service.err().is_parameter_not_found() =>
                {
                    StoreError::NotFound {
                        name: name.to_string(),
                    }
                }
                other => StoreError::Backend {
                    message: aws_sdk_ssm::error::DisplayErrorContext(&other).to_string(),
                },
            })?;

        output
            .parameter()
            .and_then(|p| p.value())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| StoreError::Empty {
                name: name.to_string(),
            })
    }
}
