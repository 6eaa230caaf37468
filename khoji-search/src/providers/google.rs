//! Google Custom Search JSON API provider.
//!
//! Requires an API key and a programmable search engine id. The API returns
//! at most ten items per call.

use std::time::Duration;

use serde::Deserialize;

use crate::config::PROVIDER_MAX_ITEMS;
use crate::error::SearchError;
use crate::provider::SearchProvider;
use crate::types::ProviderItem;

/// Production endpoint of the Custom Search JSON API.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Google Custom Search client.
#[derive(Clone)]
pub struct GoogleCustomSearch {
    api_key: String,
    engine_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GoogleCustomSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleCustomSearch")
            .field("engine_id", &self.engine_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

impl From<SearchItem> for ProviderItem {
    fn from(item: SearchItem) -> Self {
        Self {
            title: item.title.unwrap_or_else(|| "Untitled".into()),
            url: item.link.unwrap_or_default(),
            snippet: item
                .snippet
                .unwrap_or_else(|| "No preview available".into()),
        }
    }
}

impl GoogleCustomSearch {
    /// Create a client against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the key or engine id is empty or
    /// the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        Self::with_base_url(api_key, engine_id, DEFAULT_BASE_URL, timeout)
    }

    /// Create a client against a custom endpoint.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_base_url(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let api_key = api_key.into();
        let engine_id = engine_id.into();
        if api_key.trim().is_empty() || engine_id.trim().is_empty() {
            return Err(SearchError::Config(
                "Google Custom Search needs an API key and a search engine id".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            api_key,
            engine_id,
            base_url: base_url.into(),
            client,
        })
    }
}

impl SearchProvider for GoogleCustomSearch {
    async fn query(&self, text: &str, count: usize) -> Result<Vec<ProviderItem>, SearchError> {
        tracing::trace!(query = text, count, "Google Custom Search request");

        let num = count.clamp(1, PROVIDER_MAX_ITEMS).to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", text),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SearchError::Provider(format!("Google request failed: {}", e.without_url())))?
            .error_for_status()
            .map_err(|e| SearchError::Provider(format!("Google HTTP error: {}", e.without_url())))?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Provider(format!("Google response parse failed: {e}")))?;

        let items: Vec<ProviderItem> = parsed
            .items
            .into_iter()
            .take(count)
            .map(ProviderItem::from)
            .collect();
        tracing::debug!(count = items.len(), "Google results parsed");
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "Google"
    }
}
