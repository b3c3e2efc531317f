//! Indicators Module
//!
//! The indicator data model, the catalog it is loaded from, model-generated
//! indicators, and the ranking and comparison views over gathered results.

mod catalog;
mod generator;
mod ranking;
mod render;
mod types;

pub use catalog::IndicatorCatalog;
pub use generator::IndicatorGenerator;
pub use ranking::{rank, ComparisonTable, RankingView, DEFAULT_VIEW_SIZE};
pub use render::render_city_report;
pub use types::{CityReport, Indicator, IndicatorOutcome, IndicatorResult, Maturity, SourceHints};
