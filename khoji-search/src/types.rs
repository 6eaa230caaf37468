//! Core records flowing through the pipeline.
//!
//! Every record here is created fresh for one query and dropped once the
//! answer is produced.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

/// Relevance assigned when a score cannot be obtained or parsed.
pub const DEFAULT_RELEVANCE: f64 = 0.5;

/// Documents at or above this relevance are "high relevance".
pub const HIGH_RELEVANCE_THRESHOLD: f64 = 0.8;

/// A query after planning: the text sent to the provider plus the
/// commerce-intent flag that drives marketplace boosting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedQuery {
    /// Possibly rewritten query text.
    pub text: String,
    /// Whether the raw query contained a commerce keyword.
    pub commerce_intent: bool,
}

/// One raw item returned by a search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderItem {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Provider-supplied snippet.
    pub snippet: String,
}

/// A ranked search result.
///
/// Identity is the `url`. The relevance is always within `[0, 1]`; the
/// constructor and [`set_relevance`](Self::set_relevance) clamp it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDocument {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Snippet, usually rewritten by the relevance scorer.
    pub snippet: String,
    #[serde(deserialize_with = "deserialize_relevance")]
    relevance: f64,
    /// Lowercased host of `url`, empty when the URL does not parse.
    pub domain: String,
    /// Page body attached by deep retrieval, when the page was fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl CandidateDocument {
    /// Build a document, deriving its domain and clamping `relevance`.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
        relevance: f64,
    ) -> Self {
        let url = url.into();
        let domain = domain_of(&url);
        Self {
            title: title.into(),
            url,
            snippet: snippet.into(),
            relevance: clamp_relevance(relevance),
            domain,
            content: None,
        }
    }

    /// Relevance in `[0, 1]`.
    pub fn relevance(&self) -> f64 {
        self.relevance
    }

    /// Replace the relevance, clamping to `[0, 1]`.
    pub fn set_relevance(&mut self, relevance: f64) {
        self.relevance = clamp_relevance(relevance);
    }

    /// Whether this document clears [`HIGH_RELEVANCE_THRESHOLD`].
    pub fn is_high_relevance(&self) -> bool {
        self.relevance >= HIGH_RELEVANCE_THRESHOLD
    }
}

fn deserialize_relevance<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_relevance)
}

/// Clamp a relevance value into `[0, 1]`. NaN becomes [`DEFAULT_RELEVANCE`].
pub fn clamp_relevance(value: f64) -> f64 {
    if value.is_nan() {
        DEFAULT_RELEVANCE
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Lowercased host of a URL, or an empty string if it has none.
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_default()
}

/// Structured and general content extracted from one fetched page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    /// The URL that was fetched.
    pub url: String,
    /// Headings and paragraphs from the main content area, newline-joined.
    pub general_content: String,
    /// Site-adapter fields (price, rating, commodity rates, ...).
    pub domain_fields: BTreeMap<String, String>,
    /// The adapter's date when it parsed, otherwise the fetch date.
    pub timestamp: NaiveDate,
    /// Lowercased host of `url`.
    pub domain: String,
}

/// All documents for a query plus the high-relevance subset.
///
/// `all_docs` is sorted by relevance, descending. `high_relevance_docs` holds
/// the members of `all_docs` at or above [`HIGH_RELEVANCE_THRESHOLD`], in the
/// same relative order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedResultSet {
    /// Every document, most relevant first.
    pub all_docs: Vec<CandidateDocument>,
    /// The high-relevance documents, most relevant first.
    pub high_relevance_docs: Vec<CandidateDocument>,
}

impl RankedResultSet {
    /// Sort `documents` and split off the high-relevance subset.
    pub fn from_documents(mut documents: Vec<CandidateDocument>) -> Self {
        sort_by_relevance(&mut documents);
        let high_relevance_docs = documents
            .iter()
            .filter(|doc| doc.is_high_relevance())
            .cloned()
            .collect();
        Self {
            all_docs: documents,
            high_relevance_docs,
        }
    }

    /// Whether there are no documents at all.
    pub fn is_empty(&self) -> bool {
        self.all_docs.is_empty()
    }
}

/// Stable descending sort by relevance. Ties keep their input order.
pub fn sort_by_relevance(documents: &mut [CandidateDocument]) {
    documents.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
}

/// A synthesized answer and the result set it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Synthesized answer text (single line after normalisation).
    pub summary: String,
    /// The ranked documents behind the answer.
    #[serde(flatten)]
    pub results: RankedResultSet,
}
