//! Concurrent page fetching and content extraction.
//!
//! [`ContentExtractor::extract_all`] fetches every URL of a batch
//! concurrently through one HTTP client scoped to that batch, then runs the
//! site adapter (if the domain has one) and the general extractor on each
//! page. A failing URL is logged and left out; it never fails the batch.

pub mod adapters;
pub mod general;

use chrono::NaiveDate;
use futures::future::join_all;
use scraper::Html;

use crate::config::ExtractionConfig;
use crate::error::SearchError;
use crate::http;
use crate::types::{domain_of, ExtractedPage};

pub use adapters::{format_domain_fields, AdapterRegistry, DomainFields, SiteAdapter};
pub use general::extract_general_content;

/// Fetches pages and turns them into [`ExtractedPage`]s.
#[derive(Debug)]
pub struct ContentExtractor {
    config: ExtractionConfig,
    adapters: AdapterRegistry,
}

impl ContentExtractor {
    /// Create an extractor with the built-in site adapters.
    pub fn new(config: ExtractionConfig) -> Self {
        Self::with_adapters(config, AdapterRegistry::default())
    }

    /// Create an extractor with a custom adapter registry.
    pub fn with_adapters(config: ExtractionConfig, adapters: AdapterRegistry) -> Self {
        Self { config, adapters }
    }

    /// Fetch and extract every URL concurrently.
    ///
    /// Returns one page per URL that fetched with HTTP 200 and parsed, in
    /// input order. The HTTP client lives only for this call.
    pub async fn extract_all(&self, urls: &[String]) -> Vec<ExtractedPage> {
        if urls.is_empty() {
            return Vec::new();
        }

        let client = match http::build_fetch_client(&self.config) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, "could not create fetch session");
                return Vec::new();
            }
        };

        let tasks = urls.iter().map(|url| self.extract_one(&client, url));
        let pages: Vec<ExtractedPage> = join_all(tasks).await.into_iter().flatten().collect();

        tracing::info!(requested = urls.len(), extracted = pages.len(), "extraction batch finished");
        pages
    }

    /// Fetch and extract a single URL.
    pub async fn extract(&self, url: &str) -> Option<ExtractedPage> {
        self.extract_all(&[url.to_owned()]).await.pop()
    }

    async fn extract_one(&self, client: &reqwest::Client, url: &str) -> Option<ExtractedPage> {
        match fetch_html(client, url).await {
            Ok(html) => Some(self.extract_html(url, &html)),
            Err(e) => {
                tracing::warn!(url, error = %e, "page fetch failed");
                None
            }
        }
    }

    /// Extract an already-fetched page.
    pub fn extract_html(&self, url: &str, html: &str) -> ExtractedPage {
        let domain = domain_of(url);

        let domain_fields = {
            let document = Html::parse_document(html);
            self.adapters.extract(&domain, &document)
        };
        let general_content = extract_general_content(html);
        let timestamp = page_timestamp(&domain_fields);

        ExtractedPage {
            url: url.to_owned(),
            general_content,
            domain_fields,
            timestamp,
            domain,
        }
    }
}

async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String, SearchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SearchError::Fetch(e.without_url().to_string()))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(SearchError::Fetch(format!("HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| SearchError::Fetch(format!("failed to read body: {}", e.without_url())))
}

/// The adapter's `date` field when it is a `YYYY-MM-DD` date, otherwise
/// today's local date.
fn page_timestamp(fields: &DomainFields) -> NaiveDate {
    fields
        .get("date")
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .unwrap_or_else(|| chrono::Local::now().date_naive())
}
