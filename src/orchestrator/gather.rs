//! Fan-out Orchestrator
//!
//! Runs the two-stage pipeline (search, then extraction) for every
//! indicator of a city, and every city of a run. Outbound calls share one
//! bounded semaphore; cities are bounded by a second one.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use indexmap::IndexMap;
use tokio::sync::Semaphore;
use tracing::{error, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use crate::agent::{Extractor, MaturityScore};
use crate::config::GatherSettings;
use crate::error::{ToolkitError, ToolkitResult};
use crate::indicators::{CityReport, Indicator, IndicatorOutcome, IndicatorResult};
use crate::prompts;
use crate::tools::{SearchClient, SearchHit};

#[derive(Clone)]
pub struct Gatherer {
    search: Arc<dyn SearchClient>,
    extractor: Arc<Extractor>,
    permits: Arc<Semaphore>,
    city_concurrency: usize,
}

impl Gatherer {
    pub fn new(search: Arc<dyn SearchClient>, extractor: Arc<Extractor>, settings: &GatherSettings) -> Self {
        Self {
            search,
            extractor,
            permits: Arc::new(Semaphore::new(settings.max_concurrency.max(1))),
            city_concurrency: settings.city_concurrency.max(1),
        }
    }

    /// Gather every indicator for one city. The report has one slot per
    /// indicator, in input order; a failing indicator fills its own slot.
    #[instrument(skip(self, indicators), fields(indicators = indicators.len()))]
    pub async fn gather(&self, city: &str, indicators: &[Indicator]) -> ToolkitResult<CityReport> {
        let city = city.trim();
        if city.is_empty() {
            return Err(ToolkitError::InvalidInput("city must not be empty".into()));
        }
        info!("Gathering {} indicators for {}", indicators.len(), city);

        // Stage 1: all searches
        let hits = join_all(indicators.iter().map(|indicator| self.search_one(city, indicator))).await;

        // Stage 2: one extraction per successful search
        let extracted = join_all(hits.into_iter().map(|hit| async move {
            let hit = hit?;
            let score = self.extract_one(&hit.text).await?;
            Ok::<(SearchHit, MaturityScore), ToolkitError>((hit, score))
        }))
        .await;

        let outcomes: Vec<IndicatorOutcome> = indicators
            .iter()
            .zip(extracted)
            .map(|(indicator, unit)| match unit {
                Ok((hit, score)) => IndicatorOutcome::Completed(IndicatorResult {
                    indicator: indicator.clone(),
                    city: city.to_string(),
                    raw_text: hit.text,
                    citations: hit.citations,
                    maturity: score.into(),
                }),
                Err(e) => {
                    warn!("Indicator '{}' failed for {}: {}", indicator.name, city, e);
                    IndicatorOutcome::Failed {
                        indicator: indicator.clone(),
                        city: city.to_string(),
                        reason: e.to_string(),
                    }
                }
            })
            .collect();

        let report = CityReport::new(city, outcomes);
        info!(
            "{}: {} completed ({} credible), {} failed",
            city,
            report.results().count(),
            report.credible().count(),
            report.failures().count()
        );
        Ok(report)
    }

    /// Gather for several cities at once. Names are trimmed, blanks dropped
    /// and duplicates removed; the map keeps the first-seen order.
    pub async fn gather_many<S: AsRef<str>>(
        &self,
        cities: &[S],
        indicators: &[Indicator],
    ) -> IndexMap<String, CityReport> {
        let run_id = Uuid::new_v4();
        let names = normalize_cities(cities);
        let span = info_span!("gather_many", %run_id, cities = names.len());

        async move {
            let indicators: Arc<[Indicator]> = Arc::from(indicators);
            let city_limit = Arc::new(Semaphore::new(self.city_concurrency));

            let tasks: Vec<_> = names
                .iter()
                .map(|city| {
                    let gatherer = self.clone();
                    let city = city.clone();
                    let indicators = indicators.clone();
                    let city_limit = city_limit.clone();
                    tokio::spawn(
                        async move {
                            let _permit = city_limit.acquire_owned().await.ok();
                            gatherer.gather(&city, &indicators).await
                        }
                        .in_current_span(),
                    )
                })
                .collect();

            let joined = join_all(tasks).await;

            names
                .into_iter()
                .zip(joined)
                .map(|(city, joined)| {
                    let report = match joined {
                        Ok(Ok(report)) => report,
                        Ok(Err(e)) => {
                            error!("Gathering for {} failed: {}", city, e);
                            CityReport::failed(&city, &indicators, &e.to_string())
                        }
                        Err(e) => {
                            error!("City task for {} aborted: {}", city, e);
                            CityReport::failed(&city, &indicators, &format!("city task aborted: {}", e))
                        }
                    };
                    (city, report)
                })
                .collect()
        }
        .instrument(span)
        .await
    }

    /// Gather for one city and keep only the slots with credible data. The
    /// returned report doubles as that city's gathered report.
    #[instrument(skip(self, indicators))]
    pub async fn screen(&self, city: &str, indicators: &[Indicator]) -> ToolkitResult<CityReport> {
        let mut report = self.gather(city, indicators).await?;
        let checked = report.len();
        report.retain_credible();
        info!("Kept {} of {} indicators with data", report.len(), checked);
        Ok(report)
    }

    async fn search_one(&self, city: &str, indicator: &Indicator) -> ToolkitResult<SearchHit> {
        let _permit = self.permits.acquire().await.ok();
        self.search
            .search(
                &prompts::indicator_search_system(indicator, city),
                &prompts::indicator_search_user(indicator, city),
            )
            .await
    }

    async fn extract_one(&self, raw_text: &str) -> ToolkitResult<MaturityScore> {
        let _permit = self.permits.acquire().await.ok();
        self.extractor.extract(raw_text).await
    }
}

fn normalize_cities<S: AsRef<str>>(cities: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    cities
        .iter()
        .map(|c| c.as_ref().trim())
        .filter(|c| !c.is_empty())
        .filter(|c| seen.insert(c.to_string()))
        .map(str::to_string)
        .collect()
}
