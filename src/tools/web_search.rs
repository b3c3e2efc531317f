//! Web Search Client
//!
//! Conversational web search against a Perplexity-style chat endpoint that
//! answers with generated text plus the list of cited source URLs.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::agent::ChatMessage;
use crate::config::SearchSettings;
use crate::error::{ToolkitError, ToolkitResult};
use crate::utils::retry::RetryPolicy;
use crate::utils::truncate::tail;

/// Text answer and its cited URLs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub text: String,
    pub citations: Vec<String>,
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, system_prompt: &str, user_prompt: &str) -> ToolkitResult<SearchHit>;
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    model: &'a str,
    messages: [ChatMessage; 2],
    temperature: f32,
    top_p: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
    return_citations: bool,
    return_images: bool,
    return_related_questions: bool,
    stream: bool,
}

/// Search client with bounded retry over transient failures.
pub struct PerplexitySearch {
    client: Client,
    settings: SearchSettings,
    retry: RetryPolicy,
}

impl PerplexitySearch {
    pub fn new(settings: SearchSettings) -> ToolkitResult<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| ToolkitError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            settings,
            retry: RetryPolicy::default(),
        })
    }

    /// Resolve key and model from explicit values or the environment.
    pub fn from_env(api_key: Option<String>, model: Option<String>) -> ToolkitResult<Self> {
        Self::new(SearchSettings::resolve(api_key, model)?)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn payload<'a>(&'a self, system_prompt: &str, user_prompt: &str) -> SearchRequest<'a> {
        SearchRequest {
            model: &self.settings.model,
            messages: [ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)],
            temperature: self.settings.temperature,
            top_p: self.settings.top_p,
            presence_penalty: self.settings.presence_penalty,
            frequency_penalty: self.settings.frequency_penalty,
            return_citations: true,
            return_images: false,
            return_related_questions: false,
            stream: false,
        }
    }

    async fn send_once(&self, body: &SearchRequest<'_>) -> ToolkitResult<SearchHit> {
        let res = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        parse_search_response(status, &text)
    }
}

/// Validate a search response. `choices[0].message` is mandatory; missing
/// `content` reads as empty text and missing `citations` as no sources.
pub(crate) fn parse_search_response(status: StatusCode, text: &str) -> ToolkitResult<SearchHit> {
    if status != StatusCode::OK {
        error!("Search API returned status {}: {}", status, text);
        return Err(ToolkitError::Api(format!("search API returned status {}: {}", status, text)));
    }

    let json: Value = serde_json::from_str(text).map_err(|e| {
        error!("Failed to parse search response: {}", e);
        ToolkitError::Api(format!("failed to parse search response: {}", e))
    })?;

    let choice = json["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .ok_or_else(|| {
            error!("No choices found in search response");
            ToolkitError::Api("no choices found in search response".into())
        })?;

    let message = choice
        .get("message")
        .filter(|m| m.as_object().is_some_and(|o| !o.is_empty()))
        .ok_or_else(|| {
            error!("No message found in search response");
            ToolkitError::Api("no message found in search response".into())
        })?;

    let citations = json["citations"]
        .as_array()
        .map(|urls| {
            urls.iter()
                .filter_map(|u| u.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Ok(SearchHit {
        text: message["content"].as_str().unwrap_or_default().to_string(),
        citations,
    })
}

#[async_trait]
impl SearchClient for PerplexitySearch {
    #[instrument(skip_all, fields(model = %self.settings.model))]
    async fn search(&self, system_prompt: &str, user_prompt: &str) -> ToolkitResult<SearchHit> {
        if system_prompt.trim().is_empty() {
            error!("System prompt must be a non-empty string");
            return Err(ToolkitError::InvalidInput("system prompt must be a non-empty string".into()));
        }
        if user_prompt.trim().is_empty() {
            error!("User prompt must be a non-empty string");
            return Err(ToolkitError::InvalidInput("user prompt must be a non-empty string".into()));
        }

        info!("Executing search query: {}", tail(user_prompt, 100));
        let body = self.payload(system_prompt, user_prompt);
        self.retry.run("web_search", |_| self.send_once(&body)).await
    }
}
