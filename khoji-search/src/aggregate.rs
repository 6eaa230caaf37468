//! Threshold, context building and summary synthesis.

use std::sync::OnceLock;

use regex::Regex;

use crate::llm::LanguageModel;
use crate::scorer::Rankable;
use crate::types::{CandidateDocument, RankedResultSet, Summary};

/// Summary returned when there is nothing to summarise.
pub const NO_RESULTS_SUMMARY: &str = "No relevant information found for your query.";

/// Summary used when the model answers with nothing.
pub const EMPTY_RESPONSE_SUMMARY: &str =
    "Unable to generate summary. Please try refining your search query.";

/// Maximum characters of combined document context sent to the model.
pub const CONTEXT_CHARS: usize = 4000;

/// Documents summarised when none clears the high-relevance threshold.
const FALLBACK_DOC_COUNT: usize = 3;

/// Maximum characters of one document's body in the context.
const DOC_BODY_CHARS: usize = 1000;

/// Maximum characters of joined snippets in the offline fallback summary.
const FALLBACK_SUMMARY_CHARS: usize = 500;

/// Builds a [`Summary`] from ranked documents.
#[derive(Debug, Clone)]
pub struct Aggregator<M> {
    model: M,
}

impl<M: LanguageModel> Aggregator<M> {
    /// Create an aggregator over `model`.
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Summarise `documents` for `query`.
    ///
    /// The high-relevance documents are summarised when there are any,
    /// otherwise the top three. If the model call fails, the summary falls
    /// back to the first three input snippets.
    pub async fn summarize(&self, documents: Vec<CandidateDocument>, query: &str) -> Summary {
        let fallback = fallback_summary(&documents);
        let results = RankedResultSet::from_documents(documents);

        let summary_docs: &[CandidateDocument] = if results.high_relevance_docs.is_empty() {
            let n = results.all_docs.len().min(FALLBACK_DOC_COUNT);
            &results.all_docs[..n]
        } else {
            &results.high_relevance_docs
        };

        if summary_docs.is_empty() {
            return Summary {
                summary: NO_RESULTS_SUMMARY.to_owned(),
                results,
            };
        }

        let prompt = summary_prompt(query, &build_context(summary_docs));
        tracing::debug!(documents = summary_docs.len(), "requesting summary");

        let summary = match self.model.generate(&prompt).await {
            Ok(response) => {
                let response = response.trim();
                if response.is_empty() {
                    normalize_summary(EMPTY_RESPONSE_SUMMARY)
                } else {
                    normalize_summary(response)
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "summary generation failed, using snippet fallback");
                fallback
            }
        };

        Summary { summary, results }
    }
}

/// `Title / Content / Relevance%` blocks, blank-line separated, cut to
/// [`CONTEXT_CHARS`].
pub fn build_context(documents: &[CandidateDocument]) -> String {
    let combined = documents
        .iter()
        .map(|doc| {
            let body: String = doc.body().chars().take(DOC_BODY_CHARS).collect();
            format!(
                "Title: {}\nContent: {}\nRelevance: {:.2}%",
                doc.title,
                body,
                doc.relevance() * 100.0
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    combined.chars().take(CONTEXT_CHARS).collect()
}

fn fallback_summary(documents: &[CandidateDocument]) -> String {
    let joined = documents
        .iter()
        .take(FALLBACK_DOC_COUNT)
        .map(|doc| doc.snippet.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let head: String = joined.chars().take(FALLBACK_SUMMARY_CHARS).collect();
    format!("Based on the available information: {head}...")
}

fn summary_prompt(query: &str, context: &str) -> String {
    format!(
        r#"Generate a comprehensive summary of these documents for the query: "{query}"

Documents:
{context}

Requirements:
1. Focus on answering the query directly and accurately
2. Synthesize information across all provided documents
3. Include specific facts, figures, and data points when available
4. Maintain factual accuracy
5. Use clear, professional language
6. Organize information logically
7. If documents have varying relevance scores, prioritize information from higher-scoring documents
8. For specific queries (e.g., "What is the price of X?"), provide a direct answer
9. For broader queries, provide a well-structured overview
10. If information seems outdated or uncertain, note that in the summary
11. If the query names a specific person, place or product, only describe that one

Format the summary in clear, readable paragraphs with appropriate spacing."#
    )
}

fn excess_newlines() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").ok()).as_ref()
}

fn whitespace_runs() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").ok()).as_ref()
}

/// Two-pass normalisation of model output.
///
/// Runs of three or more newlines first become exactly two, then every
/// whitespace run (those two included) becomes one space. The result never
/// contains a newline: `"a\n\n\n\nb   c"` → `"a\n\nb   c"` → `"a b c"`.
pub fn normalize_summary(text: &str) -> String {
    let pass_one = match excess_newlines() {
        Some(re) => re.replace_all(text, "\n\n").into_owned(),
        None => text.to_owned(),
    };
    match whitespace_runs() {
        Some(re) => re.replace_all(&pass_one, " ").into_owned(),
        None => pass_one.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}
