//! Configuration
//!
//! Settings are resolved once from the environment (a `.env` file is
//! honored by the binary) and validated at construction. Missing keys or
//! model names are fatal configuration errors.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ToolkitError, ToolkitResult};

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EXTRACTION_MODEL: &str = "gpt-4o";
pub const DEFAULT_TOC_MODEL: &str = "o1-mini";

/// Settings for the conversational search provider.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub request_timeout: Duration,
}

impl SearchSettings {
    /// Explicit values win; otherwise `PERPLEXITY_API` and `MODEL` are read.
    pub fn resolve(api_key: Option<String>, model: Option<String>) -> ToolkitResult<Self> {
        let api_key = non_empty(api_key)
            .or_else(|| env_value("PERPLEXITY_API"))
            .ok_or_else(|| ToolkitError::Config("search API key not found (PERPLEXITY_API)".into()))?;
        let model = non_empty(model)
            .or_else(|| env_value("MODEL"))
            .ok_or_else(|| ToolkitError::Config("search model not specified (MODEL)".into()))?;

        Ok(Self {
            api_key,
            model,
            endpoint: env_value("PERPLEXITY_ENDPOINT").unwrap_or_else(|| DEFAULT_SEARCH_ENDPOINT.to_string()),
            temperature: 0.2,
            top_p: 0.9,
            presence_penalty: 0.0,
            frequency_penalty: 1.0,
            request_timeout: Duration::from_secs(120),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Settings for the chat-completion model provider.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub extraction_model: String,
    pub toc_model: String,
    pub request_timeout: Duration,
}

impl LlmSettings {
    pub fn resolve(api_key: Option<String>) -> ToolkitResult<Self> {
        let api_key = non_empty(api_key)
            .or_else(|| env_value("OPENAI_API_KEY"))
            .ok_or_else(|| ToolkitError::Config("model API key not found (OPENAI_API_KEY)".into()))?;

        Ok(Self {
            api_key,
            base_url: env_value("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            extraction_model: env_value("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_EXTRACTION_MODEL.to_string()),
            toc_model: env_value("TOC_MODEL").unwrap_or_else(|| DEFAULT_TOC_MODEL.to_string()),
            request_timeout: Duration::from_secs(120),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Bounds for the fan-out orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherSettings {
    /// Outbound provider calls in flight at once, across all cities.
    pub max_concurrency: usize,
    /// Cities processed at once.
    pub city_concurrency: usize,
}

impl Default for GatherSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            city_concurrency: 5,
        }
    }
}

/// Top-level configuration for the toolkit binary.
#[derive(Debug, Clone)]
pub struct ToolkitConfig {
    pub search: SearchSettings,
    pub llm: LlmSettings,
    pub gather: GatherSettings,
    pub catalog_path: PathBuf,
    pub log_dir: PathBuf,
}

impl ToolkitConfig {
    pub fn from_env() -> ToolkitResult<Self> {
        let timeout = Duration::from_secs(env_parse("TOOLKIT_REQUEST_TIMEOUT_SECS", 120u64)?);
        let gather = GatherSettings {
            max_concurrency: env_parse("TOOLKIT_MAX_CONCURRENCY", 8usize)?.max(1),
            city_concurrency: env_parse("TOOLKIT_CITY_CONCURRENCY", 5usize)?.max(1),
        };

        Ok(Self {
            search: SearchSettings::resolve(None, None)?.with_timeout(timeout),
            llm: LlmSettings::resolve(None)?.with_timeout(timeout),
            gather,
            catalog_path: env_value("TOOLKIT_CATALOG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/indicator_catalog.json")),
            log_dir: env_value("TOOLKIT_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs")),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn env_value(key: &str) -> Option<String> {
    non_empty(std::env::var(key).ok())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> ToolkitResult<T> {
    match env_value(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ToolkitError::Config(format!("{} is not a valid value: '{}'", key, raw))),
        None => Ok(default),
    }
}
