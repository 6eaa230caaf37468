//! Per-component configuration with sensible defaults.
//!
//! Each config is `Default`, serialisable (so the host can embed it in its
//! TOML file) and carries a `validate()` that rejects unusable values.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Search provider per-call item cap.
pub const PROVIDER_MAX_ITEMS: usize = 10;

/// Configuration for [`RetrievalClient`](crate::retrieval::RetrievalClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of documents returned by a search.
    pub max_results: usize,
    /// Minimum delay between scored items, in milliseconds.
    pub pacing_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            pacing_ms: 500,
        }
    }
}

impl RetrievalConfig {
    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Pacing interval as a [`Duration`].
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// Configuration for [`RelevanceScorer`](crate::scorer::RelevanceScorer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Minimum delay between documents in `rank`, in milliseconds.
    pub rank_pacing_ms: u64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self { rank_pacing_ms: 100 }
    }
}

impl ScorerConfig {
    /// Pacing interval for `rank` as a [`Duration`].
    pub fn rank_pacing(&self) -> Duration {
        Duration::from_millis(self.rank_pacing_ms)
    }
}

/// Configuration for [`ContentExtractor`](crate::extract::ContentExtractor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Per-fetch timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent. If `None`, one is picked from the built-in
    /// desktop browser pool for each batch.
    pub user_agent: Option<String>,
    /// `Accept-Language` header sent with every fetch.
    pub accept_language: String,
    /// `Referer` header sent with every fetch.
    pub referer: String,
    /// Skip TLS certificate validation. Off unless explicitly enabled.
    pub accept_invalid_certs: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            user_agent: None,
            accept_language: "en-US,en;q=0.5".into(),
            referer: "https://www.google.com/".into(),
            accept_invalid_certs: false,
        }
    }
}

impl ExtractionConfig {
    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
