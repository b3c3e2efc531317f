use serde::{Deserialize, Serialize};

use super::ranking::{rank, RankingView};
use crate::agent::MaturityScore;

/// Where the data for an indicator is usually found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceHints {
    pub city_level: Option<String>,
    pub national: Option<String>,
    pub toolkit: Option<String>,
}

/// A named, measurable aspect of city performance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub name: String,
    pub category: String,
    /// Threshold table, e.g. "1: <10, 2: 10-25, 3: 26-40, 4: 41-55, 5: >55"
    pub maturity_scale: String,
    #[serde(default)]
    pub sources: SourceHints,
}

impl Indicator {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        maturity_scale: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            maturity_scale: maturity_scale.into(),
            sources: SourceHints::default(),
        }
    }

    pub fn with_sources(mut self, sources: SourceHints) -> Self {
        self.sources = sources;
        self
    }
}

/// Maturity of one indicator in one city.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Maturity {
    /// A value was found and mapped to level 1..=5.
    Scored { value: f64, level: u8 },
    /// No credible data. Not a measured zero.
    Unknown,
}

impl Maturity {
    /// Level in `[0,5]`; `Unknown` reads as 0.
    pub fn score(&self) -> u8 {
        match self {
            Maturity::Scored { level, .. } => *level,
            Maturity::Unknown => 0,
        }
    }

    /// Indicator value; `Unknown` reads as 0.0.
    pub fn value(&self) -> f64 {
        match self {
            Maturity::Scored { value, .. } => *value,
            Maturity::Unknown => 0.0,
        }
    }

    pub fn is_credible(&self) -> bool {
        matches!(self, Maturity::Scored { .. })
    }
}

impl From<MaturityScore> for Maturity {
    fn from(score: MaturityScore) -> Self {
        match score.maturity_score.min(5) {
            0 => Maturity::Unknown,
            level => Maturity::Scored {
                value: score.indicator_value,
                level,
            },
        }
    }
}

/// Scored result for one (city, indicator) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub indicator: Indicator,
    pub city: String,
    pub raw_text: String,
    pub citations: Vec<String>,
    pub maturity: Maturity,
}

impl IndicatorResult {
    pub fn maturity_score(&self) -> u8 {
        self.maturity.score()
    }

    pub fn indicator_value(&self) -> f64 {
        self.maturity.value()
    }

    pub fn is_credible(&self) -> bool {
        self.maturity.is_credible()
    }
}

/// One slot of a city's batch: either a result or the reason it is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndicatorOutcome {
    Completed(IndicatorResult),
    Failed {
        indicator: Indicator,
        city: String,
        reason: String,
    },
}

impl IndicatorOutcome {
    pub fn indicator(&self) -> &Indicator {
        match self {
            IndicatorOutcome::Completed(r) => &r.indicator,
            IndicatorOutcome::Failed { indicator, .. } => indicator,
        }
    }

    pub fn result(&self) -> Option<&IndicatorResult> {
        match self {
            IndicatorOutcome::Completed(r) => Some(r),
            IndicatorOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, IndicatorOutcome::Failed { .. })
    }

    /// Score for display; failures read as 0.
    pub fn maturity_score(&self) -> u8 {
        self.result().map(|r| r.maturity_score()).unwrap_or(0)
    }
}

/// All outcomes for one city, in the order the indicators were requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityReport {
    pub city: String,
    pub outcomes: Vec<IndicatorOutcome>,
}

impl CityReport {
    pub fn new(city: impl Into<String>, outcomes: Vec<IndicatorOutcome>) -> Self {
        Self {
            city: city.into(),
            outcomes,
        }
    }

    /// A report where every indicator failed for the same reason.
    pub fn failed(city: &str, indicators: &[Indicator], reason: &str) -> Self {
        let outcomes = indicators
            .iter()
            .map(|indicator| IndicatorOutcome::Failed {
                indicator: indicator.clone(),
                city: city.to_string(),
                reason: reason.to_string(),
            })
            .collect();
        Self::new(city, outcomes)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Completed results, including unknown maturity.
    pub fn results(&self) -> impl Iterator<Item = &IndicatorResult> {
        self.outcomes.iter().filter_map(IndicatorOutcome::result)
    }

    /// Completed results with a maturity level of 1 or more.
    pub fn credible(&self) -> impl Iterator<Item = &IndicatorResult> {
        self.results().filter(|r| r.is_credible())
    }

    pub fn failures(&self) -> impl Iterator<Item = &IndicatorOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn ranked(&self, view: &RankingView) -> Vec<&IndicatorResult> {
        rank(self.results(), view)
    }

    pub fn indicators(&self) -> impl Iterator<Item = &Indicator> {
        self.outcomes.iter().map(IndicatorOutcome::indicator)
    }

    /// Drop every slot without credible data.
    pub fn retain_credible(&mut self) {
        self.outcomes
            .retain(|o| o.result().is_some_and(IndicatorResult::is_credible));
    }

    pub fn outcome_for(&self, indicator_name: &str) -> Option<&IndicatorOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.indicator().name == indicator_name)
    }
}
