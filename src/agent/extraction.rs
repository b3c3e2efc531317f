//! Extraction Step
//!
//! Turns a free-text search answer into an indicator value and a maturity
//! score through a schema-constrained model call. A zero score on the first
//! pass triggers exactly one confirmation pass; its answer is final.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::types::{ChatRequest, OutputSchema};
use super::LLMProvider;
use crate::error::{ToolkitError, ToolkitResult};
use crate::prompts;
use crate::utils::truncate::clip;

pub const MAX_MATURITY: u8 = 5;

/// Indicator value and maturity level as extracted by the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MaturityScore {
    /// Numeric value of the indicator, e.g. 47.0 datasets.
    pub indicator_value: f64,
    /// Level 0..=5; 0 only when no data was found.
    pub maturity_score: u8,
}

impl MaturityScore {
    pub fn unknown() -> Self {
        Self {
            indicator_value: 0.0,
            maturity_score: 0,
        }
    }
}

/// Strip a markdown code fence some models wrap around JSON.
fn strip_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Decode structured model output into `T`.
pub fn decode_json<T: DeserializeOwned>(content: &str) -> ToolkitResult<T> {
    serde_json::from_str(strip_fence(content))
        .map_err(|e| ToolkitError::MalformedOutput(format!("{} in '{}'", e, clip(content, 120))))
}

/// Decode a maturity score, tolerating float levels and clamping into `[0,5]`.
pub fn decode_score(content: &str) -> ToolkitResult<MaturityScore> {
    let value: Value = decode_json(content)?;

    let indicator_value = value["indicator_value"].as_f64().ok_or_else(|| {
        ToolkitError::MalformedOutput(format!("missing indicator_value in '{}'", clip(content, 120)))
    })?;
    let level = value["maturity_score"].as_f64().ok_or_else(|| {
        ToolkitError::MalformedOutput(format!("missing maturity_score in '{}'", clip(content, 120)))
    })?;

    let rounded = level.round();
    let maturity_score = if rounded < 0.0 {
        warn!("Maturity score {} below range, using 0", level);
        0
    } else if rounded > MAX_MATURITY as f64 {
        warn!("Maturity score {} above range, using {}", level, MAX_MATURITY);
        MAX_MATURITY
    } else {
        rounded as u8
    };

    Ok(MaturityScore {
        indicator_value,
        maturity_score,
    })
}

#[derive(Clone)]
pub struct Extractor {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl Extractor {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    #[instrument(skip_all)]
    pub async fn extract(&self, raw_text: &str) -> ToolkitResult<MaturityScore> {
        let first = self.ask(prompts::extraction_request(raw_text)).await?;
        if first.maturity_score != 0 {
            return Ok(first);
        }

        info!("First extraction scored 0, asking for confirmation");
        let second = self
            .ask(prompts::extraction_recheck(raw_text, first.indicator_value, first.maturity_score))
            .await?;
        debug!("Confirmation pass returned {:?}", second);
        Ok(second)
    }

    async fn ask(&self, user_prompt: String) -> ToolkitResult<MaturityScore> {
        let request = ChatRequest::new(self.model.as_str())
            .temperature(0.0)
            .system(prompts::EXTRACTION_INSTRUCTION)
            .user(user_prompt)
            .with_schema(OutputSchema::of::<MaturityScore>("maturity_score"));

        let content = self.provider.chat(request).await?;
        decode_score(&content)
    }
}
