//! Service construction from configuration.
//!
//! Everything the pipeline needs is built once here and passed in
//! explicitly. Secrets are read from the environment at this point; a
//! missing one is the only hard startup failure.

use std::sync::Arc;
use std::time::Duration;

use khoji_search::{
    Aggregator, ChatCompletionsConfig, ChatCompletionsModel, ContentExtractor, DuckDuckGo,
    GoogleCustomSearch, Pipeline, ProviderHandle, RelevanceScorer, RetrievalClient,
};

use crate::config::{KhojiConfig, LlmConfig, ProviderConfig, ProviderKind};
use crate::error::{KhojiError, Result};

/// The language model shared by the scorer, aggregator and translator.
pub type SharedModel = Arc<ChatCompletionsModel>;

/// The pipeline as wired by the host.
pub type AppPipeline = Pipeline<ProviderHandle, SharedModel>;

/// Constructed services for one process.
#[derive(Debug)]
pub struct Services {
    /// Retrieval, extraction and aggregation.
    pub pipeline: AppPipeline,
    /// The shared model, for translation.
    pub model: SharedModel,
}

impl Services {
    /// Build every service from `config`, reading secrets from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`KhojiError::Config`] if the config is invalid or a required
    /// secret is not set.
    pub fn from_config(config: &KhojiConfig) -> Result<Self> {
        Self::from_config_with_env(config, |name| std::env::var(name).ok())
    }

    /// Like [`from_config`](Self::from_config) with an explicit environment
    /// lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_config`](Self::from_config).
    pub fn from_config_with_env(
        config: &KhojiConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        config.validate()?;

        let provider = build_provider(&config.provider, &env)?;
        let model = Arc::new(build_model(&config.llm, &env)?);

        let scorer = RelevanceScorer::new(Arc::clone(&model), config.scoring.clone());
        let retrieval = RetrievalClient::new(provider, scorer, config.retrieval.clone());
        let extractor = ContentExtractor::new(config.extraction.clone());
        let aggregator = Aggregator::new(Arc::clone(&model));

        tracing::info!(
            provider = ?config.provider.kind,
            model = model.model(),
            "services ready"
        );

        Ok(Self {
            pipeline: Pipeline::new(retrieval, extractor, aggregator),
            model,
        })
    }
}

fn read_secret(env: &impl Fn(&str) -> Option<String>, var: &str) -> Result<String> {
    match env(var) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(KhojiError::Config(format!(
            "environment variable {var} is not set"
        ))),
    }
}

/// Build the configured search provider.
///
/// # Errors
///
/// Returns [`KhojiError::Config`] if a Google credential is missing.
pub fn build_provider(
    config: &ProviderConfig,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<ProviderHandle> {
    let timeout = Duration::from_secs(config.timeout_seconds);
    match config.kind {
        ProviderKind::Google => {
            let api_key = read_secret(env, &config.api_key_env)?;
            let engine_id = read_secret(env, &config.engine_id_env)?;
            let provider = match config.base_url {
                Some(ref url) => GoogleCustomSearch::with_base_url(api_key, engine_id, url, timeout)?,
                None => GoogleCustomSearch::new(api_key, engine_id, timeout)?,
            };
            Ok(ProviderHandle::Google(provider))
        }
        ProviderKind::DuckDuckGo => {
            let provider = match config.base_url {
                Some(ref url) => DuckDuckGo::with_endpoint(url, timeout),
                None => DuckDuckGo::new(timeout),
            };
            Ok(ProviderHandle::DuckDuckGo(provider))
        }
    }
}

/// Build the chat-completions model client.
///
/// # Errors
///
/// Returns [`KhojiError::Config`] if the API key is missing.
pub fn build_model(
    config: &LlmConfig,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<ChatCompletionsModel> {
    let api_key = read_secret(env, &config.api_key_env)?;
    let model = ChatCompletionsModel::new(ChatCompletionsConfig {
        base_url: config.base_url.clone(),
        model: config.model.clone(),
        api_key,
        timeout: Duration::from_secs(config.timeout_seconds),
        temperature: config.temperature,
    })?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn google_with_all_secrets_builds() {
        let env = env_from(&[
            ("GOOGLE_API_KEY", "key"),
            ("GOOGLE_SEARCH_ENGINE_ID", "cx"),
            ("GOOGLE_AI_STUDIO_KEY", "llm-key"),
        ]);
        let services = Services::from_config_with_env(&KhojiConfig::default(), env).expect("services");
        assert_eq!(services.model.model(), "gemini-2.0-flash");
        assert_eq!(services.pipeline.retrieval().default_max_results(), 10);
    }

    #[test]
    fn missing_search_key_is_config_error() {
        let env = env_from(&[("GOOGLE_AI_STUDIO_KEY", "llm-key")]);
        let err = Services::from_config_with_env(&KhojiConfig::default(), env).unwrap_err();
        assert!(matches!(err, KhojiError::Config(_)));
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn blank_model_key_is_config_error() {
        let env = env_from(&[
            ("GOOGLE_API_KEY", "key"),
            ("GOOGLE_SEARCH_ENGINE_ID", "cx"),
            ("GOOGLE_AI_STUDIO_KEY", "   "),
        ]);
        let err = Services::from_config_with_env(&KhojiConfig::default(), env).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_AI_STUDIO_KEY"));
    }

    #[test]
    fn duckduckgo_needs_no_search_secrets() {
        let mut config = KhojiConfig::default();
        config.provider.kind = ProviderKind::DuckDuckGo;
        let env = env_from(&[("GOOGLE_AI_STUDIO_KEY", "llm-key")]);
        assert!(Services::from_config_with_env(&config, env).is_ok());
    }

    #[test]
    fn custom_env_var_names_are_honoured() {
        let mut config = KhojiConfig::default();
        config.llm.api_key_env = "MY_LLM_KEY".into();
        config.provider.kind = ProviderKind::DuckDuckGo;
        let env = env_from(&[("MY_LLM_KEY", "k")]);
        assert!(Services::from_config_with_env(&config, env).is_ok());
    }

    #[test]
    fn invalid_config_rejected_before_secrets() {
        let mut config = KhojiConfig::default();
        config.extraction.timeout_seconds = 0;
        let err = Services::from_config_with_env(&config, env_from(&[])).unwrap_err();
        assert!(matches!(err, KhojiError::Search(_)));
    }
}
