//! Indicator Generator
//!
//! Asks the model for indicators (with maturity scales) for a category the
//! catalog may not cover.

use std::collections::HashSet;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::types::Indicator;
use crate::agent::{decode_json, ChatRequest, LLMProvider, OutputSchema};
use crate::error::{ToolkitError, ToolkitResult};
use crate::prompts;

/// Indicators for a category and their maturity scales, index-aligned.
#[derive(Debug, Deserialize, JsonSchema)]
struct CategoryIndicators {
    /// Measurable indicators, each with its unit.
    indicator_list: Vec<String>,
    /// Maturity scale per indicator, e.g. "1: <10, 2: 10-25, 3: 26-40, 4: 41-55, 5: >55".
    maturity_levels_list: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SingleIndicator {
    indicator: String,
    maturity_level: String,
}

#[derive(Clone)]
pub struct IndicatorGenerator {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl IndicatorGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    fn request(&self) -> ChatRequest {
        ChatRequest::new(self.model.as_str()).temperature(0.0)
    }

    #[instrument(skip(self))]
    pub async fn generate_for_category(&self, category: &str) -> ToolkitResult<Vec<Indicator>> {
        let category = require_category(category)?;

        let listing = self
            .provider
            .chat(self.request().user(prompts::category_indicators(category)))
            .await?;

        let structured = self
            .provider
            .chat(
                self.request()
                    .user(prompts::category_indicators_extraction(&listing))
                    .with_schema(OutputSchema::of::<CategoryIndicators>("category_indicators")),
            )
            .await?;
        let parsed: CategoryIndicators = decode_json(&structured)?;

        if parsed.indicator_list.len() != parsed.maturity_levels_list.len() {
            warn!(
                "Got {} indicators but {} maturity scales, keeping the aligned prefix",
                parsed.indicator_list.len(),
                parsed.maturity_levels_list.len()
            );
        }

        // Results are looked up by name, so a repeated name keeps its first scale
        let mut seen = HashSet::new();
        let indicators: Vec<Indicator> = parsed
            .indicator_list
            .into_iter()
            .zip(parsed.maturity_levels_list)
            .filter(|(name, _)| !name.trim().is_empty())
            .filter(|(name, _)| seen.insert(name.trim().to_lowercase()))
            .map(|(name, scale)| Indicator::new(name.trim(), category, scale.trim()))
            .collect();

        info!("Generated {} indicators for '{}'", indicators.len(), category);
        Ok(indicators)
    }

    #[instrument(skip(self))]
    pub async fn generate_one(&self, category: &str) -> ToolkitResult<Indicator> {
        let category = require_category(category)?;

        let content = self
            .provider
            .chat(
                self.request()
                    .system(prompts::single_indicator(category))
                    .user(format!("Category: {}", category))
                    .with_schema(OutputSchema::of::<SingleIndicator>("single_indicator")),
            )
            .await?;
        let parsed: SingleIndicator = decode_json(&content)?;

        if parsed.indicator.trim().is_empty() {
            return Err(ToolkitError::MalformedOutput("model returned an empty indicator name".into()));
        }
        Ok(Indicator::new(parsed.indicator.trim(), category, parsed.maturity_level.trim()))
    }

    /// Rewrite "1: <10, 2: 10-25, ..." as one "Level n: ..." line per level.
    #[instrument(skip(self))]
    pub async fn format_maturity_scale(&self, scale: &str) -> ToolkitResult<String> {
        if scale.trim().is_empty() {
            return Err(ToolkitError::InvalidInput("maturity scale must not be empty".into()));
        }
        let formatted = self
            .provider
            .chat(self.request().system(prompts::maturity_format(scale)).user(scale))
            .await?;
        Ok(formatted.trim().to_string())
    }
}

fn require_category(category: &str) -> ToolkitResult<&str> {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        return Err(ToolkitError::InvalidInput("category must not be empty".into()));
    }
    Ok(trimmed)
}
