//! Error types for the khoji-search crate.
//!
//! None of these escape a pipeline stage: each stage logs the error and
//! degrades to its documented default. They exist so the internal helpers
//! can use `?` and so the degradation sites can say what went wrong.
//! No API keys or sensitive data appear in error messages.

/// Errors that can occur inside the retrieval pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The search provider call failed (network, quota, bad response).
    #[error("search provider error: {0}")]
    Provider(String),

    /// The language model call failed or returned nothing usable.
    #[error("language model error: {0}")]
    Llm(String),

    /// A language model response did not follow the expected text convention.
    #[error("score parse error: {0}")]
    ScoreParse(String),

    /// A page fetch failed (network, timeout, non-200 status).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Failed to parse an HTML or JSON response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for khoji-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
