//! Configuration types for khoji.
//!
//! The TOML file holds one section per stage plus the provider and model
//! endpoints. Secrets are never stored here: the file names the environment
//! variables that hold them.

use std::path::{Path, PathBuf};

use khoji_search::{ExtractionConfig, RetrievalConfig, ScorerConfig};
use serde::{Deserialize, Serialize};

use crate::error::{KhojiError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KhojiConfig {
    /// Retrieval settings.
    pub retrieval: RetrievalConfig,
    /// Relevance scorer settings.
    pub scoring: ScorerConfig,
    /// Page fetch settings.
    pub extraction: ExtractionConfig,
    /// Search provider selection and credentials.
    pub provider: ProviderConfig,
    /// Language model endpoint.
    pub llm: LlmConfig,
}

/// Which search provider to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Custom Search JSON API (needs a key and engine id).
    #[default]
    Google,
    /// DuckDuckGo HTML endpoint (keyless).
    DuckDuckGo,
}

/// Search provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider to query.
    pub kind: ProviderKind,
    /// Endpoint override. The provider's production endpoint when `None`.
    pub base_url: Option<String>,
    /// Environment variable holding the Google API key.
    pub api_key_env: String,
    /// Environment variable holding the Google search engine id.
    pub engine_id_env: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Google,
            base_url: None,
            api_key_env: "GOOGLE_API_KEY".to_owned(),
            engine_id_env: "GOOGLE_SEARCH_ENGINE_ID".to_owned(),
            timeout_seconds: 10,
        }
    }
}

/// Default OpenAI-compatible endpoint for Gemini models.
pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Language model configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL (without `/chat/completions`).
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Sampling temperature; provider default when unset.
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_owned(),
            model: "gemini-2.0-flash".to_owned(),
            api_key_env: "GOOGLE_AI_STUDIO_KEY".to_owned(),
            timeout_seconds: 60,
            temperature: None,
        }
    }
}

impl KhojiConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| KhojiError::Config(e.to_string()))
    }

    /// Load `path` if given, else the default config file if it exists,
    /// else the built-in defaults.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::default_config_path();
                if default_path.is_file() {
                    tracing::debug!(path = %default_path.display(), "loading default config");
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| KhojiError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/khoji/config.toml`.
    ///
    /// `KHOJI_CONFIG_DIR` overrides the directory.
    pub fn default_config_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Check every section for unusable values.
    ///
    /// # Errors
    ///
    /// Returns [`KhojiError::Search`] for invalid stage settings and
    /// [`KhojiError::Config`] for invalid provider or model settings.
    pub fn validate(&self) -> Result<()> {
        self.retrieval.validate()?;
        self.extraction.validate()?;
        if self.provider.timeout_seconds == 0 {
            return Err(KhojiError::Config(
                "provider.timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.llm.timeout_seconds == 0 {
            return Err(KhojiError::Config(
                "llm.timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(KhojiError::Config("llm.model must not be empty".into()));
        }
        Ok(())
    }
}

fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("KHOJI_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("khoji"))
        .unwrap_or_else(|| PathBuf::from("/tmp/khoji-config"))
}
