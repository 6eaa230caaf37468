//! Relevance scoring with a language model, plus deterministic boosting.
//!
//! Two model-backed paths exist:
//!
//! - [`RelevanceScorer::enhance`] rewrites one search snippet and rates it,
//!   reading `Snippet:` / `Relevance:` lines from the response.
//! - [`RelevanceScorer::rank`] rates whole documents (title + body) one at a
//!   time from a bare numeric response, then sorts them.
//!
//! Neither returns an error. A failed call or a response that breaks the
//! text convention falls back to [`DEFAULT_RELEVANCE`] and is logged at
//! warn level, so systematic prompt drift shows up in the logs rather than
//! silently flattening scores.

pub mod boost;
pub mod similarity;

pub use boost::{boost, boost_at};
pub use similarity::{cosine_similarity, rank_by_similarity};

use crate::config::ScorerConfig;
use crate::error::SearchError;
use crate::llm::LanguageModel;
use crate::pacing::Pacer;
use crate::types::{clamp_relevance, CandidateDocument, PlannedQuery, DEFAULT_RELEVANCE};

/// Maximum characters of document body sent to the model by `rank`.
pub const RANK_CONTENT_CHARS: usize = 1000;

/// A rewritten snippet and its relevance.
#[derive(Debug, Clone, PartialEq)]
pub struct Enhancement {
    /// The model's snippet, or the original when none was returned.
    pub snippet: String,
    /// Relevance in `[0, 1]`.
    pub relevance: f64,
}

/// Something [`RelevanceScorer::rank`] can score.
pub trait Rankable {
    /// Document title.
    fn title(&self) -> &str;
    /// Document body shown to the model.
    fn body(&self) -> &str;
    /// Current relevance.
    fn relevance(&self) -> f64;
    /// Replace the relevance.
    fn set_relevance(&mut self, relevance: f64);
}

impl Rankable for CandidateDocument {
    fn title(&self) -> &str {
        &self.title
    }

    fn body(&self) -> &str {
        self.content.as_deref().unwrap_or(&self.snippet)
    }

    fn relevance(&self) -> f64 {
        CandidateDocument::relevance(self)
    }

    fn set_relevance(&mut self, relevance: f64) {
        CandidateDocument::set_relevance(self, relevance);
    }
}

/// Language-model relevance scorer.
#[derive(Debug, Clone)]
pub struct RelevanceScorer<M> {
    model: M,
    config: ScorerConfig,
}

impl<M: LanguageModel> RelevanceScorer<M> {
    /// Create a scorer over `model`.
    pub fn new(model: M, config: ScorerConfig) -> Self {
        Self { model, config }
    }

    /// Rewrite a search snippet and rate its relevance to `query`.
    ///
    /// For commerce queries the model's rating is multiplied by
    /// [`boost`]`(url, None)`. The result is always clamped to `[0, 1]`.
    /// Any failure yields the original snippet with [`DEFAULT_RELEVANCE`].
    pub async fn enhance(
        &self,
        title: &str,
        snippet: &str,
        url: &str,
        query: &PlannedQuery,
    ) -> Enhancement {
        let prompt = enhance_prompt(&query.text, title, snippet);
        let parsed = match self.model.generate(&prompt).await {
            Ok(response) => parse_enhancement(&response),
            Err(e) => Err(e),
        };

        match parsed {
            Ok((enhanced, relevance)) => {
                let relevance = if query.commerce_intent {
                    relevance * boost(url, None)
                } else {
                    relevance
                };
                Enhancement {
                    snippet: enhanced.unwrap_or_else(|| snippet.to_owned()),
                    relevance: clamp_relevance(relevance),
                }
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "snippet enhancement failed, using defaults");
                Enhancement {
                    snippet: snippet.to_owned(),
                    relevance: DEFAULT_RELEVANCE,
                }
            }
        }
    }

    /// Rate each document against `query`, one at a time, and sort them by
    /// relevance, descending.
    ///
    /// Calls are spaced by the configured rank pacing. A failed or
    /// non-numeric response scores [`DEFAULT_RELEVANCE`].
    pub async fn rank<D: Rankable>(&self, query: &str, mut documents: Vec<D>) -> Vec<D> {
        let mut pacer = Pacer::new(self.config.rank_pacing());

        for doc in &mut documents {
            pacer.ready().await;
            let prompt = rank_prompt(query, doc.title(), doc.body());
            let score = match self.model.generate(&prompt).await {
                Ok(response) => parse_bare_score(&response),
                Err(e) => Err(e),
            };
            let score = score.unwrap_or_else(|e| {
                tracing::warn!(title = doc.title(), error = %e, "relevance scoring failed, using default");
                DEFAULT_RELEVANCE
            });
            doc.set_relevance(score);
        }

        documents.sort_by(|a, b| b.relevance().total_cmp(&a.relevance()));
        documents
    }
}

fn enhance_prompt(query: &str, title: &str, snippet: &str) -> String {
    format!(
        r#"Given the search query: "{query}"
And this search result:
Title: {title}
Content: {snippet}

Please:
1. Generate a more informative and concise snippet (max 150 words)
2. Rate the relevance to the query on a scale of 0-1
3. If the query is about prices or shopping and the content is from daraz.com.np, give it higher relevance
4. Prioritize recent price information over older content

Format your response as:
Snippet: [your enhanced snippet]
Relevance: [score between 0-1]"#
    )
}

fn rank_prompt(query: &str, title: &str, body: &str) -> String {
    let content: String = body.chars().take(RANK_CONTENT_CHARS).collect();
    format!(
        r#"Analyze the semantic relevance between this search query and document:

Query: "{query}"

Document Title: {title}
Document Content: {content}

Tasks:
1. Evaluate how well the document answers the query
2. Consider semantic meaning, not just keyword matches
3. Check information relevance and quality
4. Account for content freshness and authority

Output a single number between 0 and 1 where:
- 1.0: Perfectly relevant, directly answers the query
- 0.8-0.9: Highly relevant, provides good information
- 0.5-0.7: Moderately relevant, contains some useful information
- 0.1-0.4: Slightly relevant, mentions related topics
- 0.0: Not relevant at all

Format response as a single decimal number (e.g., 0.85)"#
    )
}

/// Read `Snippet:` and `Relevance:` lines.
///
/// The snippet is optional (empty counts as missing). A missing or
/// non-numeric relevance is a [`SearchError::ScoreParse`].
fn parse_enhancement(response: &str) -> Result<(Option<String>, f64), SearchError> {
    let mut snippet = None;
    let mut relevance = None;

    for line in response.lines().map(str::trim_start) {
        if let Some(rest) = line.strip_prefix("Snippet:") {
            let rest = rest.trim();
            if !rest.is_empty() {
                snippet = Some(rest.to_owned());
            }
        } else if let Some(rest) = line.strip_prefix("Relevance:") {
            relevance = Some(parse_score(rest)?);
        }
    }

    let relevance =
        relevance.ok_or_else(|| SearchError::ScoreParse("response has no Relevance line".into()))?;
    Ok((snippet, relevance))
}

/// Parse a response that should be a single number.
fn parse_bare_score(response: &str) -> Result<f64, SearchError> {
    parse_score(response).map(clamp_relevance)
}

fn parse_score(text: &str) -> Result<f64, SearchError> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(SearchError::ScoreParse(format!(
            "expected a number, got {:?}",
            truncate_for_log(trimmed)
        ))),
    }
}

fn truncate_for_log(text: &str) -> String {
    text.chars().take(40).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replies from a fixed script, one entry per call; records prompts.
    struct ScriptedModel {
        replies: Mutex<Vec<Result<String, String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<&str, &str>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .rev()
                        .map(|r| r.map(str::to_owned).map_err(str::to_owned))
                        .collect(),
                ),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl LanguageModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String, SearchError> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_owned());
            }
            let next = self.replies.lock().ok().and_then(|mut r| r.pop());
            match next {
                Some(Ok(text)) => Ok(text),
                Some(Err(msg)) => Err(SearchError::Llm(msg)),
                None => Err(SearchError::Llm("script exhausted".into())),
            }
        }
    }

    fn scorer(replies: Vec<Result<&str, &str>>) -> RelevanceScorer<ScriptedModel> {
        RelevanceScorer::new(ScriptedModel::new(replies), ScorerConfig { rank_pacing_ms: 0 })
    }

    fn plain_query() -> PlannedQuery {
        PlannedQuery {
            text: "history of patan".into(),
            commerce_intent: false,
        }
    }

    fn commerce_query() -> PlannedQuery {
        PlannedQuery {
            text: "iphone price (site:daraz.com.np OR site:*.com.np)".into(),
            commerce_intent: true,
        }
    }

    #[tokio::test]
    async fn enhance_parses_snippet_and_relevance() {
        let s = scorer(vec![Ok("Snippet: Patan is an old city.\nRelevance: 0.7")]);
        let e = s.enhance("Patan", "old", "https://a.com", &plain_query()).await;
        assert_eq!(e.snippet, "Patan is an old city.");
        assert!((e.relevance - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn enhance_prompt_contains_query_title_and_snippet() {
        let s = scorer(vec![Ok("Relevance: 0.1")]);
        s.enhance("Durbar Square", "temples", "https://a.com", &plain_query()).await;
        let prompts = s.model.prompts.lock().expect("lock");
        assert!(prompts[0].contains("\"history of patan\""));
        assert!(prompts[0].contains("Title: Durbar Square"));
        assert!(prompts[0].contains("Content: temples"));
        assert!(prompts[0].contains("max 150 words"));
    }

    #[tokio::test]
    async fn enhance_tolerates_indented_lines() {
        let s = scorer(vec![Ok("  Snippet: indented\n    Relevance: 0.4\n")]);
        let e = s.enhance("t", "orig", "https://a.com", &plain_query()).await;
        assert_eq!(e.snippet, "indented");
        assert!((e.relevance - 0.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn enhance_keeps_original_snippet_when_missing() {
        let s = scorer(vec![Ok("Relevance: 0.3")]);
        let e = s.enhance("t", "original text", "https://a.com", &plain_query()).await;
        assert_eq!(e.snippet, "original text");
        assert!((e.relevance - 0.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn enhance_defaults_on_unparseable_relevance() {
        let s = scorer(vec![Ok("Snippet: new\nRelevance: very high")]);
        let e = s.enhance("t", "original", "https://a.com", &plain_query()).await;
        assert_eq!(e.snippet, "original");
        assert!((e.relevance - DEFAULT_RELEVANCE).abs() < 1e-9);
    }

    #[tokio::test]
    async fn enhance_defaults_on_missing_relevance() {
        let s = scorer(vec![Ok("Snippet: only a snippet")]);
        let e = s.enhance("t", "original", "https://a.com", &plain_query()).await;
        assert_eq!(e.snippet, "original");
        assert!((e.relevance - DEFAULT_RELEVANCE).abs() < 1e-9);
    }

    #[tokio::test]
    async fn enhance_defaults_on_model_error() {
        let s = scorer(vec![Err("HTTP 500")]);
        let e = s.enhance("t", "original", "https://a.com", &plain_query()).await;
        assert_eq!(e.snippet, "original");
        assert!((e.relevance - DEFAULT_RELEVANCE).abs() < 1e-9);
    }

    #[tokio::test]
    async fn enhance_rejects_nan() {
        let s = scorer(vec![Ok("Relevance: NaN")]);
        let e = s.enhance("t", "original", "https://a.com", &plain_query()).await;
        assert!((e.relevance - DEFAULT_RELEVANCE).abs() < 1e-9);
    }

    #[tokio::test]
    async fn enhance_clamps_out_of_range_without_intent() {
        let s = scorer(vec![Ok("Relevance: 7")]);
        let e = s.enhance("t", "s", "https://a.com", &plain_query()).await;
        assert!((e.relevance - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn commerce_intent_boosts_marketplace_and_clamps() {
        let s = scorer(vec![Ok("Relevance: 0.3"), Ok("Relevance: 0.6")]);
        let boosted = s
            .enhance("phone", "s", "https://www.daraz.com.np/p/1", &commerce_query())
            .await;
        assert!((boosted.relevance - 0.6).abs() < 1e-9);

        let capped = s
            .enhance("phone", "s", "https://www.daraz.com.np/p/2", &commerce_query())
            .await;
        assert!((capped.relevance - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn no_boost_without_commerce_intent() {
        let s = scorer(vec![Ok("Relevance: 0.3")]);
        let e = s
            .enhance("phone", "s", "https://www.daraz.com.np/p/1", &plain_query())
            .await;
        assert!((e.relevance - 0.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn rank_scores_and_sorts() {
        let s = scorer(vec![Ok("0.2"), Ok(" 0.95 \n"), Ok("not a number"), Err("down")]);
        let docs = vec![
            CandidateDocument::new("a", "https://a.com", "sa", 0.0),
            CandidateDocument::new("b", "https://b.com", "sb", 0.0),
            CandidateDocument::new("c", "https://c.com", "sc", 0.0),
            CandidateDocument::new("d", "https://d.com", "sd", 0.0),
        ];
        let ranked = s.rank("query", docs).await;
        let titles: Vec<&str> = ranked.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["b", "c", "d", "a"]);
        assert!((ranked[1].relevance() - DEFAULT_RELEVANCE).abs() < 1e-9);
        assert!((ranked[2].relevance() - DEFAULT_RELEVANCE).abs() < 1e-9);
    }

    #[tokio::test]
    async fn rank_clamps_scores() {
        let s = scorer(vec![Ok("1.8"), Ok("-0.4")]);
        let docs = vec![
            CandidateDocument::new("hi", "https://a.com", "", 0.0),
            CandidateDocument::new("lo", "https://b.com", "", 0.0),
        ];
        let ranked = s.rank("q", docs).await;
        assert!((ranked[0].relevance() - 1.0).abs() < 1e-9);
        assert!(ranked[1].relevance().abs() < 1e-9);
    }

    #[tokio::test]
    async fn rank_truncates_body_and_prefers_content() {
        let s = scorer(vec![Ok("0.5")]);
        let mut doc = CandidateDocument::new("t", "https://a.com", "snippet text", 0.0);
        doc.content = Some("x".repeat(5000));
        s.rank("q", vec![doc]).await;

        let prompts = s.model.prompts.lock().expect("lock");
        assert!(prompts[0].contains(&"x".repeat(RANK_CONTENT_CHARS)));
        assert!(!prompts[0].contains(&"x".repeat(RANK_CONTENT_CHARS + 1)));
        assert!(!prompts[0].contains("snippet text"));
    }

    #[tokio::test]
    async fn rank_empty_is_empty() {
        let s = scorer(vec![]);
        let ranked: Vec<CandidateDocument> = s.rank("q", vec![]).await;
        assert!(ranked.is_empty());
    }

    #[test]
    fn parse_enhancement_requires_relevance() {
        assert!(matches!(
            parse_enhancement("Snippet: x"),
            Err(SearchError::ScoreParse(_))
        ));
        let (snippet, rel) = parse_enhancement("Snippet:\nRelevance: 0.25").expect("parse");
        assert!(snippet.is_none());
        assert!((rel - 0.25).abs() < 1e-9);
    }

    #[test]
    fn parse_bare_score_accepts_whitespace() {
        assert!((parse_bare_score("\n0.85\n").expect("parse") - 0.85).abs() < 1e-9);
        assert!(parse_bare_score("0.85 (high)").is_err());
        assert!(parse_bare_score("inf").is_err());
    }
}
