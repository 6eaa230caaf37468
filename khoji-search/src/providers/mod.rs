//! Search provider implementations.
//!
//! [`ProviderHandle`] dispatches to whichever provider the host configured.

pub mod duckduckgo;
pub mod google;

pub use duckduckgo::DuckDuckGo;
pub use google::GoogleCustomSearch;

use crate::error::SearchError;
use crate::provider::SearchProvider;
use crate::types::ProviderItem;

/// One of the built-in providers, chosen at startup.
#[derive(Debug, Clone)]
pub enum ProviderHandle {
    /// Google Custom Search JSON API.
    Google(GoogleCustomSearch),
    /// DuckDuckGo HTML scraper.
    DuckDuckGo(DuckDuckGo),
}

impl SearchProvider for ProviderHandle {
    async fn query(&self, text: &str, count: usize) -> Result<Vec<ProviderItem>, SearchError> {
        match self {
            Self::Google(provider) => provider.query(text, count).await,
            Self::DuckDuckGo(provider) => provider.query(text, count).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Google(provider) => provider.name(),
            Self::DuckDuckGo(provider) => provider.name(),
        }
    }
}
