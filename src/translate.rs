//! English/Nepali translation through the language model.
//!
//! Translation never fails: a model error or an empty response returns
//! the input unchanged.

use std::collections::HashMap;

use khoji_search::{LanguageModel, Summary};
use serde::{Deserialize, Serialize};

/// Output language of the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Nepali.
    Ne,
}

impl Locale {
    /// Message shown when retrieval finds nothing.
    pub fn no_results(self) -> &'static str {
        match self {
            Self::En => "No results found",
            Self::Ne => "कुनै नतिजा फेला परेन",
        }
    }

    /// Suffix for the result count line ("10 results found").
    pub fn results_found(self) -> &'static str {
        match self {
            Self::En => "results found",
            Self::Ne => "नतिजाहरू फेला परे",
        }
    }

    /// Heading above the high-relevance documents.
    pub fn high_relevance_heading(self) -> &'static str {
        match self {
            Self::En => "Most relevant sources",
            Self::Ne => "सबैभन्दा सान्दर्भिक स्रोतहरू",
        }
    }

    /// Heading above the remaining documents.
    pub fn other_results_heading(self) -> &'static str {
        match self {
            Self::En => "Other results",
            Self::Ne => "अन्य नतिजाहरू",
        }
    }
}

/// Translates text with a language model.
#[derive(Debug, Clone)]
pub struct Translator<M> {
    model: M,
}

impl<M: LanguageModel> Translator<M> {
    /// Create a translator over `model`.
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// English → Nepali.
    pub async fn to_nepali(&self, text: &str) -> String {
        self.translate(text, to_nepali_prompt(text)).await
    }

    /// Nepali → English.
    pub async fn from_nepali(&self, text: &str) -> String {
        self.translate(text, from_nepali_prompt(text)).await
    }

    async fn translate(&self, text: &str, prompt: String) -> String {
        if text.trim().is_empty() {
            return text.to_owned();
        }
        match self.model.generate(&prompt).await {
            Ok(response) => {
                let translated = response.trim();
                if translated.is_empty() {
                    text.to_owned()
                } else {
                    translated.to_owned()
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "translation failed, keeping original text");
                text.to_owned()
            }
        }
    }

    /// Translate the summary text and every document's title and snippet
    /// to Nepali.
    ///
    /// Each document is translated once; the high-relevance list is
    /// rebuilt from the translated documents.
    pub async fn localise_summary(&self, mut summary: Summary) -> Summary {
        summary.summary = self.to_nepali(&summary.summary).await;

        for doc in &mut summary.results.all_docs {
            doc.title = self.to_nepali(&doc.title).await;
            doc.snippet = self.to_nepali(&doc.snippet).await;
        }

        let translated: HashMap<&str, &khoji_search::CandidateDocument> = summary
            .results
            .all_docs
            .iter()
            .map(|d| (d.url.as_str(), d))
            .collect();
        let high = summary
            .results
            .high_relevance_docs
            .iter()
            .map(|d| translated.get(d.url.as_str()).map_or_else(|| d.clone(), |t| (*t).clone()))
            .collect();
        summary.results.high_relevance_docs = high;
        summary
    }
}

fn to_nepali_prompt(text: &str) -> String {
    format!(
        "Translate the following English text to Nepali.
Keep the formatting and maintain professional language.
If there are technical terms, provide appropriate Nepali translations or keep them in English if necessary.

Text to translate:
{text}

Requirements:
1. Maintain the original meaning and context
2. Keep numbers, dates, and technical terms accurate
3. Use proper Nepali grammar and script
4. Keep the same paragraph structure
5. If certain technical terms are better understood in English, keep them in English

Provide the Nepali translation only, without any explanations."
    )
}

fn from_nepali_prompt(text: &str) -> String {
    format!(
        "Translate the following Nepali text to English.
Keep the formatting and maintain professional language.
If there are technical terms, provide appropriate English translations.

Text to translate:
{text}

Requirements:
1. Maintain the original meaning and context
2. Keep numbers and technical terms accurate
3. Use proper English grammar
4. Keep the same paragraph structure
5. For technical terms, use standard English terminology

Provide the English translation only, without any explanations."
    )
}
