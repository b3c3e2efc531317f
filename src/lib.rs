//! Smart City Toolkit
//!
//! Research assistant for smart-city indicators:
//! - Web search per (city, indicator) with retry
//! - Structured extraction of indicator values and maturity scores
//! - Concurrent fan-out across indicators and cities
//! - Rankings, cross-city comparison and report drafting

pub mod agent;
pub mod config;
pub mod error;
pub mod indicators;
pub mod orchestrator;
pub mod prompts;
pub mod tools;
pub mod utils;

// Re-exports for convenience
pub use agent::{Extractor, LLMProvider, MaturityScore, OpenAICompatibleProvider};
pub use config::ToolkitConfig;
pub use error::{ToolkitError, ToolkitResult};
pub use indicators::{CityReport, Indicator, IndicatorCatalog, IndicatorOutcome, IndicatorResult, Maturity};
pub use orchestrator::{Gatherer, ReportDrafter, Session};
pub use tools::{PerplexitySearch, SearchClient, SearchHit};
