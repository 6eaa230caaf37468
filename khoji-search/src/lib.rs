//! # khoji-search
//!
//! Answers natural-language questions from ranked, deduplicated web search
//! results.
//!
//! ## Stages
//!
//! - [`planner`]: detects commerce intent and scopes such queries to the
//!   marketplace and national-domain sites
//! - [`retrieval`]: queries the search provider, drops duplicate and
//!   excluded URLs, scores each item with the language model and sorts
//! - [`scorer`]: snippet enhancement, whole-document ranking, domain and
//!   recency boosting, cosine similarity
//! - [`extract`]: concurrent page fetches with site adapters and general
//!   content extraction
//! - [`aggregate`]: high-relevance thresholding and summary synthesis
//!
//! Every stage degrades instead of failing: a broken provider yields no
//! documents, a bad model response yields a default relevance, a failed
//! fetch drops that page, a failed summary falls back to the snippets.
//!
//! ## Security
//!
//! - API keys are passed in by the host and never logged
//! - Search queries are logged only at trace level
//! - Page fetches validate TLS certificates unless explicitly configured not to

pub mod aggregate;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod llm;
pub mod pacing;
pub mod pipeline;
pub mod planner;
pub mod provider;
pub mod providers;
pub mod retrieval;
pub mod scorer;
pub mod types;

pub use aggregate::Aggregator;
pub use config::{ExtractionConfig, RetrievalConfig, ScorerConfig};
pub use error::{Result, SearchError};
pub use extract::{format_domain_fields, ContentExtractor};
pub use llm::{ChatCompletionsConfig, ChatCompletionsModel, LanguageModel};
pub use pipeline::{DeepAnswer, Pipeline};
pub use provider::SearchProvider;
pub use providers::{DuckDuckGo, GoogleCustomSearch, ProviderHandle};
pub use retrieval::RetrievalClient;
pub use scorer::RelevanceScorer;
pub use types::{CandidateDocument, ExtractedPage, PlannedQuery, ProviderItem, RankedResultSet, Summary};

/// Fetch one page and extract its content with the default settings.
///
/// Returns `None` if the page could not be fetched or did not answer with
/// HTTP 200.
///
/// # Examples
///
/// ```no_run
/// # async fn example() {
/// if let Some(page) = khoji_search::fetch_page_content("https://example.com").await {
///     println!("{}", page.general_content);
/// }
/// # }
/// ```
pub async fn fetch_page_content(url: &str) -> Option<ExtractedPage> {
    ContentExtractor::new(ExtractionConfig::default())
        .extract(url)
        .await
}
