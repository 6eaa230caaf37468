//! End-to-end wiring of the pipeline stages.
//!
//! A [`Pipeline`] owns explicit instances of every stage. Nothing here is
//! global; the host constructs one pipeline and calls it per query.

use std::collections::HashMap;

use crate::aggregate::Aggregator;
use crate::extract::ContentExtractor;
use crate::llm::LanguageModel;
use crate::provider::SearchProvider;
use crate::retrieval::RetrievalClient;
use crate::types::{ExtractedPage, Summary};

/// A summary produced with fetched page content, plus the pages.
#[derive(Debug, Clone)]
pub struct DeepAnswer {
    /// The synthesized answer and ranked documents.
    pub summary: Summary,
    /// Every page that fetched successfully.
    pub pages: Vec<ExtractedPage>,
}

/// Retrieval, extraction and aggregation for one provider and one model.
#[derive(Debug)]
pub struct Pipeline<P, M> {
    retrieval: RetrievalClient<P, M>,
    extractor: ContentExtractor,
    aggregator: Aggregator<M>,
}

impl<P: SearchProvider, M: LanguageModel> Pipeline<P, M> {
    /// Assemble a pipeline from its stages.
    pub fn new(retrieval: RetrievalClient<P, M>, extractor: ContentExtractor, aggregator: Aggregator<M>) -> Self {
        Self {
            retrieval,
            extractor,
            aggregator,
        }
    }

    /// The retrieval stage.
    pub fn retrieval(&self) -> &RetrievalClient<P, M> {
        &self.retrieval
    }

    /// The extraction stage.
    pub fn extractor(&self) -> &ContentExtractor {
        &self.extractor
    }

    /// The aggregation stage.
    pub fn aggregator(&self) -> &Aggregator<M> {
        &self.aggregator
    }

    /// Search and summarise from snippets only.
    pub async fn answer(&self, query: &str, max_results: usize) -> Summary {
        let documents = self.retrieval.search(query, max_results).await;
        tracing::info!(count = documents.len(), "retrieval finished");
        self.aggregator.summarize(documents, query).await
    }

    /// Search, fetch every result page, re-rank on page content and
    /// summarise.
    ///
    /// Documents whose page could not be fetched are ranked on their
    /// snippet.
    pub async fn answer_deep(&self, query: &str, max_results: usize) -> DeepAnswer {
        let mut documents = self.retrieval.search(query, max_results).await;
        if documents.is_empty() {
            return DeepAnswer {
                summary: self.aggregator.summarize(documents, query).await,
                pages: Vec::new(),
            };
        }

        let urls: Vec<String> = documents.iter().map(|d| d.url.clone()).collect();
        let pages = self.extractor.extract_all(&urls).await;

        let content_by_url: HashMap<&str, &str> = pages
            .iter()
            .filter(|p| !p.general_content.is_empty())
            .map(|p| (p.url.as_str(), p.general_content.as_str()))
            .collect();
        for doc in &mut documents {
            if let Some(content) = content_by_url.get(doc.url.as_str()) {
                doc.content = Some((*content).to_owned());
            }
        }

        tracing::info!(documents = documents.len(), pages = pages.len(), "re-ranking on page content");
        let ranked = self.retrieval.scorer().rank(query, documents).await;
        let summary = self.aggregator.summarize(ranked, query).await;

        DeepAnswer { summary, pages }
    }
}
