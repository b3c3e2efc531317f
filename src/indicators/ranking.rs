//! Ranking views and cross-city comparison.
//!
//! Unknown maturity (score 0) never takes part in a ranking; it stays in
//! the report and in its counts.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::{CityReport, Indicator, IndicatorResult};

/// Fallback size when a selection is empty.
pub const DEFAULT_VIEW_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingView {
    /// Highest maturity first
    Top(usize),
    /// Lowest maturity first
    Bottom(usize),
    /// Named indicators, in result order
    Selected(Vec<String>),
    All,
}

impl Default for RankingView {
    fn default() -> Self {
        RankingView::Top(DEFAULT_VIEW_SIZE)
    }
}

impl std::fmt::Display for RankingView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankingView::Top(n) => write!(f, "Top {} Indicators", n),
            RankingView::Bottom(n) => write!(f, "Bottom {} Indicators", n),
            RankingView::Selected(names) => write!(f, "Selected Indicators ({})", names.len()),
            RankingView::All => write!(f, "All Indicators"),
        }
    }
}

/// Apply `view` to `results`, keeping only credible ones. Sorting is stable,
/// so equal scores keep their original order.
pub fn rank<'a, I>(results: I, view: &RankingView) -> Vec<&'a IndicatorResult>
where
    I: IntoIterator<Item = &'a IndicatorResult>,
{
    let mut credible: Vec<&IndicatorResult> = results.into_iter().filter(|r| r.is_credible()).collect();

    match view {
        RankingView::Top(n) => {
            credible.sort_by(|a, b| b.maturity_score().cmp(&a.maturity_score()));
            credible.truncate(*n);
        }
        RankingView::Bottom(n) => {
            credible.sort_by_key(|r| r.maturity_score());
            credible.truncate(*n);
        }
        RankingView::Selected(names) if names.is_empty() => {
            credible.truncate(DEFAULT_VIEW_SIZE);
        }
        RankingView::Selected(names) => {
            credible.retain(|r| names.iter().any(|n| n == &r.indicator.name));
        }
        RankingView::All => {}
    }

    credible
}

/// Maturity scores per indicator (rows) and city (columns).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    pub indicators: Vec<String>,
    pub scores: IndexMap<String, Vec<u8>>,
}

impl ComparisonTable {
    /// Unknown and failed indicators read as 0.
    pub fn build<'a, I>(indicators: &[Indicator], reports: I) -> Self
    where
        I: IntoIterator<Item = &'a CityReport>,
    {
        let scores = reports
            .into_iter()
            .map(|report| {
                let row = indicators
                    .iter()
                    .map(|ind| {
                        report
                            .outcome_for(&ind.name)
                            .map(|o| o.maturity_score())
                            .unwrap_or(0)
                    })
                    .collect();
                (report.city.clone(), row)
            })
            .collect();

        Self {
            indicators: indicators.iter().map(|i| i.name.clone()).collect(),
            scores,
        }
    }

    pub fn to_markdown(&self) -> String {
        let cities: Vec<&String> = self.scores.keys().collect();
        let mut out = String::from("| Indicator |");
        for city in &cities {
            out.push_str(&format!(" {} |", city));
        }
        out.push_str("\n|---|");
        for _ in &cities {
            out.push_str("---|");
        }
        out.push('\n');

        for (row, name) in self.indicators.iter().enumerate() {
            out.push_str(&format!("| {} |", name));
            for city in &cities {
                let score = self.scores[*city].get(row).copied().unwrap_or(0);
                out.push_str(&format!(" {} |", score));
            }
            out.push('\n');
        }
        out
    }
}
