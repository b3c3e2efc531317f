//! Session state for the terminal front-end.
//!
//! Holds everything the user has chosen or produced so far, in memory only.
//! Core operations never read it; the front-end passes the relevant fields
//! explicitly.

use indexmap::IndexMap;

use super::report::{Stakeholders, TocDraft, TocRequest};
use crate::error::{ToolkitError, ToolkitResult};
use crate::indicators::{CityReport, Indicator, RankingView};

pub const MAX_CITIES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub cities: Vec<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    /// Indicators for the current category, screened when a city was selected.
    pub indicators: Vec<Indicator>,
    pub view: RankingView,
    pub reports: IndexMap<String, CityReport>,
    pub stakeholders: Option<Stakeholders>,
    pub toc: Option<TocDraft>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a city. Returns `false` when it is already selected.
    pub fn add_city(&mut self, name: &str) -> ToolkitResult<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ToolkitError::InvalidInput("city must not be empty".into()));
        }
        if self.cities.iter().any(|c| c == name) {
            return Ok(false);
        }
        if self.cities.len() >= MAX_CITIES {
            return Err(ToolkitError::InvalidInput(format!(
                "at most {} cities can be compared",
                MAX_CITIES
            )));
        }
        self.cities.push(name.to_string());
        Ok(true)
    }

    /// Replace the city selection. On error the previous selection is kept.
    /// Reports of cities that stay selected are kept.
    pub fn set_cities<S: AsRef<str>>(&mut self, names: &[S]) -> ToolkitResult<()> {
        let mut next = Session::new();
        for name in names {
            if name.as_ref().trim().is_empty() {
                continue;
            }
            next.add_city(name.as_ref())?;
        }
        if next.cities.is_empty() {
            return Err(ToolkitError::InvalidInput("select at least one city".into()));
        }
        self.cities = next.cities;
        let cities = &self.cities;
        self.reports.retain(|city, _| cities.contains(city));
        Ok(())
    }

    pub fn primary_city(&self) -> Option<&str> {
        self.cities.first().map(String::as_str)
    }

    /// Switch category. Gathered reports belong to the old indicators and are dropped.
    pub fn set_category(&mut self, category: &str, indicators: Vec<Indicator>) {
        self.category = Some(category.trim().to_string());
        self.indicators = indicators;
        self.reports.clear();
    }

    /// Switch category to the indicators that survived screening. The
    /// screening report is kept as the gathered report of its city.
    pub fn set_screened_category(&mut self, category: &str, screened: CityReport) {
        self.set_category(category, screened.indicators().cloned().collect());
        self.reports.insert(screened.city.clone(), screened);
    }

    pub fn selected_indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    /// Selected cities without a gathered report, in selection order.
    pub fn missing_cities(&self) -> Vec<String> {
        self.cities
            .iter()
            .filter(|city| !self.reports.contains_key(city.as_str()))
            .cloned()
            .collect()
    }

    /// Add freshly gathered reports, keeping the map in selection order.
    pub fn merge_reports(&mut self, reports: IndexMap<String, CityReport>) {
        self.reports.extend(reports);
        let order = &self.cities;
        self.reports.sort_by(|a, _, b, _| {
            let rank = |city: &String| order.iter().position(|c| c == city).unwrap_or(usize::MAX);
            rank(a).cmp(&rank(b))
        });
    }

    /// Build a table-of-contents request from the current selection, so
    /// changes to city, country or stakeholders are always picked up.
    pub fn toc_request(&self, policy_levers: &[String], hint: &str) -> ToolkitResult<TocRequest> {
        let city = self
            .primary_city()
            .ok_or_else(|| ToolkitError::InvalidInput("no city selected".into()))?;
        let country = self
            .country
            .as_deref()
            .ok_or_else(|| ToolkitError::InvalidInput("no country set".into()))?;

        let mut request = TocRequest::new(city, country, policy_levers.to_vec()).with_structure(hint);
        if let Some(ref stakeholders) = self.stakeholders {
            request = request.with_stakeholders(stakeholders.clone());
        }
        Ok(request)
    }
}
