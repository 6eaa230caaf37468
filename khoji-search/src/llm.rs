//! Generative language model collaborator.
//!
//! The pipeline only needs `generate(prompt) -> text`. The contract is a
//! text convention, not a schema: callers parse the returned text themselves
//! and treat a response that breaks the convention as a soft failure.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::SearchError;

/// A text-in, text-out language model.
///
/// Implementations must be `Send + Sync`; one instance is shared by the
/// scorer and the aggregator of a pipeline.
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Llm`] if the request fails or the service
    /// returns no text.
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, SearchError>> + Send;
}

impl<T: LanguageModel> LanguageModel for &T {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, SearchError>> + Send {
        (**self).generate(prompt)
    }
}

impl<T: LanguageModel> LanguageModel for Arc<T> {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, SearchError>> + Send {
        (**self).generate(prompt)
    }
}

/// Configuration for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct ChatCompletionsConfig {
    /// Base URL up to (not including) `/chat/completions`.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Bearer token.
    pub api_key: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Sampling temperature, provider default when `None`.
    pub temperature: Option<f32>,
}

impl std::fmt::Debug for ChatCompletionsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Non-streaming client for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct ChatCompletionsModel {
    config: ChatCompletionsConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsModel {
    /// Create a client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the HTTP client cannot be built.
    pub fn new(config: ChatCompletionsConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
        });
        if let (Some(temp), Some(obj)) = (self.config.temperature, body.as_object_mut()) {
            obj.insert("temperature".into(), serde_json::json!(temp));
        }
        body
    }
}

impl LanguageModel for ChatCompletionsModel {
    async fn generate(&self, prompt: &str) -> Result<String, SearchError> {
        tracing::trace!(model = %self.config.model, chars = prompt.len(), "language model request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&self.build_request_body(prompt))
            .send()
            .await
            .map_err(|e| SearchError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Llm(format!("response read failed: {e}")))?;

        if !status.is_success() {
            return Err(SearchError::Llm(format!(
                "HTTP {}: {}",
                status.as_u16(),
                extract_error_message(&body)
            )));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| SearchError::Llm(format!("invalid response JSON: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SearchError::Llm("response contained no choices".into()))
    }
}

/// Pull `error.message` out of an error body, falling back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ChatCompletionsConfig {
        ChatCompletionsConfig {
            base_url: format!("{}/v1/", server.uri()),
            model: "test-model".into(),
            api_key: "sk-test".into(),
            timeout: Duration::from_secs(5),
            temperature: Some(0.2),
        }
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ChatCompletionsConfig {
            base_url: "https://example.com".into(),
            model: "m".into(),
            api_key: "super-secret".into(),
            timeout: Duration::from_secs(1),
            temperature: None,
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn request_body_includes_prompt_and_temperature() {
        let model = ChatCompletionsModel::new(ChatCompletionsConfig {
            base_url: "https://example.com".into(),
            model: "m".into(),
            api_key: "k".into(),
            timeout: Duration::from_secs(1),
            temperature: Some(0.5),
        })
        .expect("client");
        let body = model.build_request_body("hello");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["stream"], false);
        assert!(body.get("temperature").is_some());
    }

    #[test]
    fn extract_error_message_prefers_json_message() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"quota exhausted"}}"#),
            "quota exhausted"
        );
        assert_eq!(extract_error_message("plain failure\n"), "plain failure");
    }

    #[tokio::test]
    async fn generate_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"model": "test-model"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "Relevance: 0.9" } }]
            })))
            .mount(&server)
            .await;

        let model = ChatCompletionsModel::new(config_for(&server)).expect("client");
        let text = model.generate("score this").await.expect("should succeed");
        assert_eq!(text, "Relevance: 0.9");
    }

    #[tokio::test]
    async fn generate_maps_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "rate limited" }
            })))
            .mount(&server)
            .await;

        let model = ChatCompletionsModel::new(config_for(&server)).expect("client");
        let err = model.generate("x").await.unwrap_err();
        assert!(matches!(err, SearchError::Llm(_)));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn generate_without_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let model = ChatCompletionsModel::new(config_for(&server)).expect("client");
        let err = model.generate("x").await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[tokio::test]
    async fn arc_wrapped_model_delegates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "ok" } }]
            })))
            .mount(&server)
            .await;

        let model = Arc::new(ChatCompletionsModel::new(config_for(&server)).expect("client"));
        assert_eq!(model.generate("x").await.expect("ok"), "ok");
    }
}
