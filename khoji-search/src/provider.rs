//! Trait definition for pluggable search providers.
//!
//! A provider turns query text into an ordered list of raw
//! [`ProviderItem`]s. It does no scoring and no deduplication; the
//! [`RetrievalClient`](crate::retrieval::RetrievalClient) does both.

use std::future::Future;
use std::sync::Arc;

use crate::error::SearchError;
use crate::types::ProviderItem;

/// A pluggable web search backend.
///
/// All implementations must be `Send + Sync`.
pub trait SearchProvider: Send + Sync {
    /// Run a search and return at most `count` items in provider order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Provider`] on network, quota or response
    /// format failures. An empty result is `Ok(vec![])`, not an error.
    fn query(
        &self,
        text: &str,
        count: usize,
    ) -> impl Future<Output = Result<Vec<ProviderItem>, SearchError>> + Send;

    /// Short human-readable provider name, used in logs.
    fn name(&self) -> &'static str;
}

impl<T: SearchProvider> SearchProvider for &T {
    fn query(
        &self,
        text: &str,
        count: usize,
    ) -> impl Future<Output = Result<Vec<ProviderItem>, SearchError>> + Send {
        (**self).query(text, count)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

impl<T: SearchProvider> SearchProvider for Arc<T> {
    fn query(
        &self,
        text: &str,
        count: usize,
    ) -> impl Future<Output = Result<Vec<ProviderItem>, SearchError>> + Send {
        (**self).query(text, count)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
