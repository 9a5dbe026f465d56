//! Secret and parameter lookups.
//!
//! Both stores are plain key-value reads: a name goes in, a string comes
//! out. The AWS-backed implementations live in [`aws`]; [`StaticStore`]
//! serves fixed values for tests and local runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::StoreError;

pub mod aws;

pub use aws::{SecretsManagerStore, SsmParameterStore};

/// Managed secret store (Secrets Manager style).
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the secret's string value.
    async fn secret_string(&self, name: &str) -> Result<String, StoreError>;
}

/// Parameter store (SSM style). Values are decrypted.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn parameter(&self, name: &str) -> Result<String, StoreError>;
}

/// Fixed name → value map implementing both store traits.
///
/// Counts lookups so callers can assert that cached values are not refetched.
#[derive(Debug, Default)]
pub struct StaticStore {
    values: HashMap<String, String>,
    lookups: AtomicUsize,
}

impl StaticStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Number of lookups served so far, hits and misses alike.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn get(&self, name: &str) -> Result<String, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        match self.values.get(name) {
            Some(value) if value.is_empty() => Err(StoreError::Empty {
                name: name.to_string(),
            }),
            Some(value) => Ok(value.clone()),
            None => Err(StoreError::NotFound {
                name: name.to_string(),
            }),
        }
    }
}

#[async_trait]
impl SecretStore for StaticStore {
    async fn secret_string(&self, name: &str) -> Result<String, StoreError> {
        self.get(name)
    }
}

#[async_trait]
impl ParameterStore for StaticStore {
    async fn parameter(&self, name: &str) -> Result<String, StoreError> {
        self.get(name)
    }
}
