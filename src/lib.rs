//! Khoji: search-backed question answering.
//!
//! This crate is the host around [`khoji_search`]:
//! query → plan → search → score → (fetch pages) → summarise → localise
//!
//! # Architecture
//!
//! - **Config**: TOML file with one section per stage, secrets read from
//!   the environment
//! - **Services**: builds the provider, model and pipeline from config
//! - **Translate**: English/Nepali translation of queries and answers
//! - **Evaluation**: JSONL batch runner for offline answer scoring

pub mod config;
pub mod error;
pub mod evaluation;
pub mod services;
pub mod translate;

pub use config::KhojiConfig;
pub use error::{KhojiError, Result};
pub use services::{AppPipeline, Services};
pub use translate::{Locale, Translator};

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "khoji=info,khoji_search=info";

/// Initialise tracing to stderr so stdout carries only answers and JSON.
///
/// `RUST_LOG` overrides [`DEFAULT_LOG_FILTER`].
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();
}
