//! Report Drafter
//!
//! Drafts the table of contents of a jobs-and-growth literature review and
//! the stakeholder list that feeds it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::agent::{ChatRequest, LLMProvider};
use crate::error::{ToolkitError, ToolkitResult};
use crate::prompts;

pub const DEFAULT_MAX_QUERIES: usize = 5;

const POLICY_LEVERS_JSON: &str = include_str!("../../data/policy_levers.json");

/// The bundled policy-lever catalog.
pub fn load_policy_levers() -> ToolkitResult<Vec<String>> {
    Ok(serde_json::from_str(POLICY_LEVERS_JSON)?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "snake_case")]
pub enum Stakeholders {
    /// Entered by the user as a comma-separated list.
    Provided(Vec<String>),
    /// Markdown produced by the model.
    Generated(String),
}

impl Stakeholders {
    pub fn parse_list(text: &str) -> Self {
        Stakeholders::Provided(
            text.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Stakeholders::Provided(list) => list.is_empty(),
            Stakeholders::Generated(text) => text.trim().is_empty(),
        }
    }

    /// Text handed to the table-of-contents prompt.
    pub fn render(&self) -> String {
        match self {
            Stakeholders::Provided(list) => list.join(", "),
            Stakeholders::Generated(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocRequest {
    pub city: String,
    pub country: String,
    pub policy_levers: Vec<String>,
    pub stakeholders: Option<Stakeholders>,
    pub report_structure: String,
    pub max_queries_per_section: usize,
}

impl TocRequest {
    pub fn new(city: impl Into<String>, country: impl Into<String>, policy_levers: Vec<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
            policy_levers,
            stakeholders: None,
            report_structure: String::new(),
            max_queries_per_section: DEFAULT_MAX_QUERIES,
        }
    }

    pub fn with_stakeholders(mut self, stakeholders: Stakeholders) -> Self {
        self.stakeholders = Some(stakeholders);
        self
    }

    pub fn with_structure(mut self, hint: impl Into<String>) -> Self {
        self.report_structure = hint.into();
        self
    }

    pub fn with_max_queries(mut self, max_queries: usize) -> Self {
        self.max_queries_per_section = max_queries.max(1);
        self
    }

    fn validate(&self) -> ToolkitResult<()> {
        require("city", &self.city)?;
        require("country", &self.country)
    }
}

/// A drafted table of contents with the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocDraft {
    pub request: TocRequest,
    pub markdown: String,
}

#[derive(Clone)]
pub struct ReportDrafter {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl ReportDrafter {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    #[instrument(skip(self, request), fields(city = %request.city, country = %request.country))]
    pub async fn draft_toc(&self, request: TocRequest) -> ToolkitResult<TocDraft> {
        request.validate()?;

        let stakeholders = request
            .stakeholders
            .as_ref()
            .map(Stakeholders::render)
            .unwrap_or_default();
        let prompt = prompts::table_of_contents(
            request.city.trim(),
            request.country.trim(),
            &request.policy_levers,
            &stakeholders,
            &request.report_structure,
            request.max_queries_per_section,
        );

        // Reasoning models take a single user message and no sampling parameters
        let markdown = self
            .provider
            .chat(ChatRequest::new(self.model.as_str()).user(prompt))
            .await?;
        info!("Drafted table of contents ({} chars)", markdown.len());

        Ok(TocDraft { request, markdown })
    }

    #[instrument(skip(self))]
    pub async fn generate_stakeholders(&self, city: &str, country: &str) -> ToolkitResult<Stakeholders> {
        require("city", city)?;
        require("country", country)?;

        let text = self
            .provider
            .chat(ChatRequest::new(self.model.as_str()).user(prompts::stakeholders(city.trim(), country.trim())))
            .await?;
        Ok(Stakeholders::Generated(text))
    }
}

fn require(field: &str, value: &str) -> ToolkitResult<()> {
    if value.trim().is_empty() {
        return Err(ToolkitError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}
