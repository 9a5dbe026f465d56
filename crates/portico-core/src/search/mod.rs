//! Web search provider abstraction.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ProviderError;

pub mod google;

pub use google::GoogleSearch;

/// Number of results requested per query.
pub const RESULT_COUNT: u8 = 10;

/// A web search backend. Result items are opaque JSON passed through to the model.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Value>, ProviderError>;
}
