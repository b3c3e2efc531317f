use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, error, instrument};

use super::types::ChatRequest;
use crate::config::LlmSettings;
use crate::error::{ToolkitError, ToolkitResult};
use crate::utils::retry::RetryPolicy;

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Run one chat completion and return the message content.
    async fn chat(&self, request: ChatRequest) -> ToolkitResult<String>;

    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> ToolkitResult<String> {
        let mut request = ChatRequest::new(model);
        if let Some(sys) = system {
            request = request.system(sys);
        }
        self.chat(request.user(prompt)).await
    }
}

/// Chat-completion client for any OpenAI-compatible endpoint.
pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> ToolkitResult<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| ToolkitError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            api_key: Some(settings.api_key.clone()),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, body: &Value) -> ToolkitResult<String> {
        let mut request = self.client.post(self.endpoint()).json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await?;
        let status = res.status();
        let text = res.text().await?;
        parse_completion(status, &text)
    }
}

/// Validate a chat-completion response and pull out the message content.
pub(crate) fn parse_completion(status: StatusCode, text: &str) -> ToolkitResult<String> {
    if status != StatusCode::OK {
        error!("Model provider returned status {}: {}", status, text);
        return Err(ToolkitError::Api(format!("model provider returned status {}: {}", status, text)));
    }

    let json: Value = serde_json::from_str(text)
        .map_err(|e| ToolkitError::Api(format!("failed to parse model response: {}", e)))?;

    json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ToolkitError::Api("no message content found in model response".into()))
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    #[instrument(skip_all, fields(model = %request.model, structured = request.schema.is_some()))]
    async fn chat(&self, request: ChatRequest) -> ToolkitResult<String> {
        let body = request.to_body();
        debug!("Sending chat completion with {} messages", request.messages.len());
        self.retry
            .run("chat_completion", |_| self.send_once(&body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_ok() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#;
        assert_eq!(parse_completion(StatusCode::OK, body).unwrap(), "hi");
    }

    #[test]
    fn test_parse_completion_non_200_is_api_error() {
        let err = parse_completion(StatusCode::INTERNAL_SERVER_ERROR, "boom").unwrap_err();
        assert!(matches!(err, ToolkitError::Api(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_parse_completion_missing_choices_is_api_error() {
        let err = parse_completion(StatusCode::OK, r#"{"id":"x"}"#).unwrap_err();
        assert!(matches!(err, ToolkitError::Api(_)));
    }

    #[test]
    fn test_parse_completion_bad_json_is_api_error() {
        let err = parse_completion(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, ToolkitError::Api(_)));
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let provider = OpenAICompatibleProvider::new("http://localhost:1/v1/".into(), None);
        assert_eq!(provider.endpoint(), "http://localhost:1/v1/chat/completions");
    }
}
