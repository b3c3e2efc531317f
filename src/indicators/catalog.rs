//! Indicator Catalog
//!
//! Read-only table of indicators grouped in named sheets. The source is a
//! JSON document `{ "<sheet>": [ {row}, ... ] }` whose rows use the
//! spreadsheet column headers as keys.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::types::{Indicator, SourceHints};
use crate::error::{ToolkitError, ToolkitResult};

pub const EXPECTED_SHEETS: [&str; 6] = [
    "Digital Transformation",
    "Policies and Regulations",
    "People and Digital Skills",
    "City Functions",
    "City",
    "Data",
];

const COL_CATEGORY: &str = "Category";
const COL_INDICATOR: &str = "Indicator";
const COL_MATURITY: &str = "Maturity Assessment (1-5)";
const COL_CITY_SOURCE: &str = "City Level Source";
const COL_NATIONAL_SOURCE: &str = "National Data Source";
const COL_TOOLKIT_SOURCE: &str = "Toolkit Source";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorCatalog {
    indicators: Vec<Indicator>,
}

impl IndicatorCatalog {
    #[instrument]
    pub fn load(path: &Path) -> ToolkitResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ToolkitError::Catalog(format!("cannot read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json(&raw)?;
        info!("Loaded {} indicators from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Parse a catalog document. Any missing sheet or required column fails the load.
    pub fn from_json(raw: &str) -> ToolkitResult<Self> {
        let doc: Value = serde_json::from_str(raw)
            .map_err(|e| ToolkitError::Catalog(format!("catalog is not valid JSON: {}", e)))?;
        let sheets = doc
            .as_object()
            .ok_or_else(|| ToolkitError::Catalog("catalog root must be an object of sheets".into()))?;

        let mut indicators = Vec::new();
        for sheet in EXPECTED_SHEETS {
            let rows = sheets
                .get(sheet)
                .ok_or_else(|| ToolkitError::Catalog(format!("missing sheet '{}'", sheet)))?
                .as_array()
                .ok_or_else(|| ToolkitError::Catalog(format!("sheet '{}' must be a list of rows", sheet)))?;

            for (idx, row) in rows.iter().enumerate() {
                let row = row.as_object().ok_or_else(|| {
                    ToolkitError::Catalog(format!("sheet '{}' row {} is not an object", sheet, idx + 1))
                })?;
                indicators.push(parse_row(sheet, idx, row)?);
            }
        }

        Ok(Self { indicators })
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    /// Unique categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for ind in &self.indicators {
            if !seen.contains(&ind.category.as_str()) {
                seen.push(&ind.category);
            }
        }
        seen
    }

    pub fn indicators_in(&self, category: &str) -> Vec<Indicator> {
        self.indicators
            .iter()
            .filter(|i| i.category.eq_ignore_ascii_case(category.trim()))
            .cloned()
            .collect()
    }
}

fn parse_row(sheet: &str, idx: usize, row: &Map<String, Value>) -> ToolkitResult<Indicator> {
    let required = |col: &str| -> ToolkitResult<String> {
        match row.get(col) {
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Null) => Ok(String::new()),
            Some(_) => Err(ToolkitError::Catalog(format!(
                "sheet '{}' row {}: column '{}' must be text",
                sheet,
                idx + 1,
                col
            ))),
            None => Err(ToolkitError::Catalog(format!(
                "sheet '{}' row {}: missing column '{}'",
                sheet,
                idx + 1,
                col
            ))),
        }
    };
    let optional = |col: &str| -> Option<String> {
        row.get(col)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let sources = SourceHints {
        city_level: optional(COL_CITY_SOURCE),
        national: optional(COL_NATIONAL_SOURCE),
        toolkit: optional(COL_TOOLKIT_SOURCE),
    };

    Ok(Indicator::new(required(COL_INDICATOR)?, required(COL_CATEGORY)?, required(COL_MATURITY)?)
        .with_sources(sources))
}
