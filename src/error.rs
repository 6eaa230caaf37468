//! Error types for the khoji host.

/// Top-level error type for configuration, service construction and the
/// evaluation harness.
#[derive(Debug, thiserror::Error)]
pub enum KhojiError {
    /// Configuration error (bad TOML, invalid values, missing secrets).
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the search library while constructing services.
    #[error("search error: {0}")]
    Search(#[from] khoji_search::SearchError),

    /// Batch evaluation error (malformed input record, serialization).
    #[error("evaluation error: {0}")]
    Evaluation(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, KhojiError>;
