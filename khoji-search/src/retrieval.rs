//! Retrieval: plan → provider → filter/dedup → score → sort → truncate.
//!
//! Items are scored one at a time with a pacing delay between them, to stay
//! polite to the provider and the model service. Ordering only matters at
//! the end, when the batch is sorted by relevance.

use std::collections::HashSet;

use crate::config::{RetrievalConfig, PROVIDER_MAX_ITEMS};
use crate::llm::LanguageModel;
use crate::pacing::Pacer;
use crate::planner;
use crate::provider::SearchProvider;
use crate::scorer::RelevanceScorer;
use crate::types::{sort_by_relevance, CandidateDocument};

/// URL fragments that disqualify a result regardless of relevance:
/// document/image formats and the video-hosting site.
pub const EXCLUDED_URL_PATTERNS: &[&str] = &[".pdf", ".doc", ".xls", ".jpg", ".png", "youtube.com"];

/// Extra provider items requested to make up for filtered ones.
const OVERFETCH: usize = 5;

/// Whether `url` should be dropped before scoring.
pub fn is_excluded_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    EXCLUDED_URL_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Produces a deduplicated, scored and sorted candidate list for a query.
#[derive(Debug, Clone)]
pub struct RetrievalClient<P, M> {
    provider: P,
    scorer: RelevanceScorer<M>,
    config: RetrievalConfig,
}

impl<P: SearchProvider, M: LanguageModel> RetrievalClient<P, M> {
    /// Create a client from explicit service instances.
    pub fn new(provider: P, scorer: RelevanceScorer<M>, config: RetrievalConfig) -> Self {
        Self {
            provider,
            scorer,
            config,
        }
    }

    /// The configured default result count.
    pub fn default_max_results(&self) -> usize {
        self.config.max_results
    }

    /// The scorer used for per-item enhancement.
    pub fn scorer(&self) -> &RelevanceScorer<M> {
        &self.scorer
    }

    /// Search for `query` and return at most `max_results` documents,
    /// most relevant first, with no two sharing a URL.
    ///
    /// Never fails: provider errors and empty responses yield an empty list.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<CandidateDocument> {
        let query = query.trim();
        if query.is_empty() || max_results == 0 {
            tracing::warn!("empty query or zero max_results, nothing to search");
            return Vec::new();
        }

        let planned = planner::plan(query);
        tracing::trace!(query = %planned.text, commerce = planned.commerce_intent, "planned query");

        let count = (max_results + OVERFETCH).min(PROVIDER_MAX_ITEMS);
        let items = match self.provider.query(&planned.text, count).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(provider = self.provider.name(), error = %e, "search provider failed");
                return Vec::new();
            }
        };

        if items.is_empty() {
            tracing::warn!(provider = self.provider.name(), "search provider returned no items");
            return Vec::new();
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut pacer = Pacer::new(self.config.pacing());
        let mut documents: Vec<CandidateDocument> = Vec::new();

        for item in items {
            if documents.len() >= max_results {
                break;
            }
            if item.url.is_empty() || seen.contains(&item.url) || is_excluded_url(&item.url) {
                tracing::debug!(url = %item.url, "skipping duplicate or excluded result");
                continue;
            }

            pacer.ready().await;
            let enhanced = self
                .scorer
                .enhance(&item.title, &item.snippet, &item.url, &planned)
                .await;

            tracing::debug!(url = %item.url, relevance = enhanced.relevance, "scored result");
            seen.insert(item.url.clone());
            documents.push(CandidateDocument::new(
                item.title,
                item.url,
                enhanced.snippet,
                enhanced.relevance,
            ));
        }

        sort_by_relevance(&mut documents);
        documents.truncate(max_results);

        if documents.is_empty() {
            tracing::warn!("no usable results after filtering");
        }
        documents
    }
}
