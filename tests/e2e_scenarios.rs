use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;
use tokio_test::assert_ok;

use smart_city_toolkit::agent::{ChatRequest, Extractor, LLMProvider};
use smart_city_toolkit::config::GatherSettings;
use smart_city_toolkit::indicators::{Indicator, IndicatorOutcome, Maturity, RankingView};
use smart_city_toolkit::orchestrator::{Gatherer, Session};
use smart_city_toolkit::tools::{SearchClient, SearchHit};
use smart_city_toolkit::{ToolkitError, ToolkitResult};

#[derive(Clone, Default)]
struct Scripted {
    text: String,
    delay_ms: u64,
    fail: bool,
}

/// Calls currently running and the most seen at once.
#[derive(Default)]
struct InFlight {
    now: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    async fn hold(&self, delay_ms: u64) {
        let now = self.now.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        self.now.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Answers per indicator name, read back from the system prompt.
struct MockSearch {
    scripts: HashMap<String, Scripted>,
    barrier: Option<Arc<Barrier>>,
    in_flight: Option<Arc<InFlight>>,
    panic_city: Option<&'static str>,
    calls: AtomicUsize,
}

impl MockSearch {
    fn new(scripts: &[(&str, Scripted)]) -> Self {
        Self {
            scripts: scripts.iter().map(|(n, s)| (n.to_string(), s.clone())).collect(),
            barrier: None,
            in_flight: None,
            panic_city: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    fn with_in_flight(mut self, in_flight: Arc<InFlight>) -> Self {
        self.in_flight = Some(in_flight);
        self
    }

    fn panicking_for(mut self, city: &'static str) -> Self {
        self.panic_city = Some(city);
        self
    }
}

#[async_trait]
impl SearchClient for MockSearch {
    async fn search(&self, system_prompt: &str, _user_prompt: &str) -> ToolkitResult<SearchHit> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = Regex::new(r#"on "(.+?)" for the city of"#)
            .unwrap()
            .captures(system_prompt)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let script = self.scripts.get(&name).cloned().unwrap_or_default();

        if let Some(city) = self.panic_city {
            if system_prompt.contains(city) {
                panic!("search backend crashed for {}", city);
            }
        }
        if let Some(ref barrier) = self.barrier {
            barrier.wait().await;
        }
        match self.in_flight {
            Some(ref in_flight) => in_flight.hold(script.delay_ms).await,
            None => tokio::time::sleep(Duration::from_millis(script.delay_ms)).await,
        }

        if script.fail {
            return Err(ToolkitError::Api("search API returned status 503".into()));
        }
        Ok(SearchHit {
            text: script.text,
            citations: vec![format!("https://stats.example.org/{}", name.len())],
        })
    }
}

/// Reads "Data Found" and "Maturity Level" out of the raw text it is given.
struct MockExtractionModel {
    barrier: Option<Arc<Barrier>>,
    in_flight: Option<Arc<InFlight>>,
    calls: AtomicUsize,
}

impl MockExtractionModel {
    fn new() -> Self {
        Self { barrier: None, in_flight: None, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl LLMProvider for MockExtractionModel {
    async fn chat(&self, request: ChatRequest) -> ToolkitResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref barrier) = self.barrier {
            barrier.wait().await;
        }
        if let Some(ref in_flight) = self.in_flight {
            in_flight.hold(10).await;
        }

        let prompt = request.last_user_content().unwrap_or_default();
        let grab = |pattern: &str| {
            Regex::new(pattern)
                .unwrap()
                .captures(prompt)
                .and_then(|c| c[1].parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        let value = grab(r"Data Found:\s*([\d.]+)");
        let level = grab(r"Maturity Level:\s*(\d)");
        Ok(format!(r#"{{"indicator_value": {}, "maturity_score": {}}}"#, value, level))
    }
}

fn found(value: u32, level: u8, delay_ms: u64) -> Scripted {
    Scripted {
        text: format!("- Data Found: {}\n- Maturity Level: {}", value, level),
        delay_ms,
        fail: false,
    }
}

fn indicators(names: &[&str]) -> Vec<Indicator> {
    names
        .iter()
        .map(|n| Indicator::new(*n, "Connectivity", "1: <10, 2: 10-25, 3: 26-40, 4: 41-55, 5: >55"))
        .collect()
}

fn gatherer(search: Arc<MockSearch>, model: Arc<MockExtractionModel>) -> Gatherer {
    let extractor = Arc::new(Extractor::new(model, "gpt-4o"));
    Gatherer::new(search, extractor, &GatherSettings::default())
}

#[tokio::test]
async fn test_e2e_order_follows_input_not_completion() {
    let search = Arc::new(MockSearch::new(&[
        ("I1", found(10, 1, 60)),
        ("I2", found(30, 3, 30)),
        ("I3", found(50, 4, 0)),
    ]));
    let model = Arc::new(MockExtractionModel::new());
    let gatherer = gatherer(search.clone(), model.clone());

    let report = assert_ok!(gatherer.gather("Springfield", &indicators(&["I1", "I2", "I3"])).await);

    let names: Vec<&str> = report.outcomes.iter().map(|o| o.indicator().name.as_str()).collect();
    assert_eq!(names, vec!["I1", "I2", "I3"]);
    let scores: Vec<u8> = report.outcomes.iter().map(|o| o.maturity_score()).collect();
    assert_eq!(scores, vec![1, 3, 4]);
    assert_eq!(search.calls.load(Ordering::SeqCst), 3);
    assert_eq!(model.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_e2e_both_stages_run_concurrently() {
    // Each barrier only opens once all three calls of a stage are in flight.
    let search = Arc::new(
        MockSearch::new(&[("I1", found(10, 1, 0)), ("I2", found(30, 3, 0)), ("I3", found(50, 4, 0))])
            .with_barrier(Arc::new(Barrier::new(3))),
    );
    let model = Arc::new(MockExtractionModel {
        barrier: Some(Arc::new(Barrier::new(3))),
        in_flight: None,
        calls: AtomicUsize::new(0),
    });
    let gatherer = gatherer(search, model);

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        gatherer.gather("Springfield", &indicators(&["I1", "I2", "I3"])),
    )
    .await
    .expect("stages did not run concurrently")
    .unwrap();

    assert_eq!(report.credible().count(), 3);
}

#[tokio::test]
async fn test_e2e_clear_answer_needs_one_extraction() {
    let search = Arc::new(MockSearch::new(&[(
        "Open datasets",
        Scripted {
            text: "Indicator: Open datasets\nData Found: 47\nMaturity Level: 4".into(),
            ..Default::default()
        },
    )]));
    let model = Arc::new(MockExtractionModel::new());
    let gatherer = gatherer(search, model.clone());

    let report = gatherer.gather("Springfield", &indicators(&["Open datasets"])).await.unwrap();
    let result = report.outcomes[0].result().unwrap();

    assert_eq!(result.maturity, Maturity::Scored { value: 47.0, level: 4 });
    assert_eq!(result.citations.len(), 1);
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_e2e_springfield_without_data() {
    let search = Arc::new(MockSearch::new(&[(
        "Broadband penetration",
        Scripted {
            text: "No credible data was found for Springfield.".into(),
            ..Default::default()
        },
    )]));
    let model = Arc::new(MockExtractionModel::new());
    let gatherer = gatherer(search, model.clone());

    let report = gatherer
        .gather("Springfield", &indicators(&["Broadband penetration"]))
        .await
        .unwrap();
    let result = report.outcomes[0].result().unwrap();

    assert_eq!(result.maturity, Maturity::Unknown);
    assert_eq!(result.maturity_score(), 0);
    assert_eq!(result.indicator_value(), 0.0);
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);

    // Kept in the full set, absent from rankings
    assert_eq!(report.results().count(), 1);
    assert!(report.ranked(&RankingView::Top(5)).is_empty());
}

#[tokio::test]
async fn test_e2e_failing_indicator_is_isolated() {
    let search = Arc::new(MockSearch::new(&[
        ("I1", found(10, 2, 0)),
        ("I2", Scripted { fail: true, ..Default::default() }),
        ("I3", found(50, 5, 0)),
    ]));
    let model = Arc::new(MockExtractionModel::new());
    let gatherer = gatherer(search, model.clone());

    let report = gatherer.gather("Springfield", &indicators(&["I1", "I2", "I3"])).await.unwrap();

    assert_eq!(report.credible().count(), 2);
    match &report.outcomes[1] {
        IndicatorOutcome::Failed { indicator, city, reason } => {
            assert_eq!(indicator.name, "I2");
            assert_eq!(city, "Springfield");
            assert!(reason.contains("503"));
        }
        other => panic!("expected a failed slot, got {:?}", other),
    }
    // No extraction for the failed search
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_e2e_gather_many_cities() {
    let search = Arc::new(MockSearch::new(&[("I1", found(10, 2, 5)), ("I2", found(60, 5, 0))]));
    let model = Arc::new(MockExtractionModel::new());
    let gatherer = gatherer(search.clone(), model);

    let cities = [" Springfield", "Shelbyville", "Springfield", "  "];
    let reports = gatherer.gather_many(&cities, &indicators(&["I1", "I2"])).await;

    let keys: Vec<&str> = reports.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Springfield", "Shelbyville"]);
    for (city, report) in &reports {
        assert_eq!(&report.city, city);
        assert_eq!(report.len(), 2);
        assert_eq!(report.failures().count(), 0);
    }
    assert_eq!(search.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_e2e_screen_keeps_only_indicators_with_data() {
    let search = Arc::new(MockSearch::new(&[
        ("I1", found(10, 2, 0)),
        ("I2", Scripted { text: "nothing published".into(), ..Default::default() }),
        ("I3", Scripted { fail: true, ..Default::default() }),
    ]));
    let model = Arc::new(MockExtractionModel::new());
    let gatherer = gatherer(search, model);

    let kept = gatherer.screen("Springfield", &indicators(&["I1", "I2", "I3"])).await.unwrap();
    assert_eq!(kept.city, "Springfield");
    assert_eq!(kept.len(), 1);
    assert_eq!(kept.credible().next().unwrap().indicator.name, "I1");
}

#[tokio::test]
async fn test_e2e_screened_city_is_not_searched_again() {
    let search = Arc::new(MockSearch::new(&[
        ("I1", found(10, 2, 0)),
        ("I2", found(30, 3, 0)),
        ("I3", found(50, 4, 0)),
        ("I4", Scripted { text: "nothing published".into(), ..Default::default() }),
    ]));
    let model = Arc::new(MockExtractionModel::new());
    let gatherer = gatherer(search.clone(), model);

    let mut session = Session::new();
    session.set_cities(&["Springfield", "Shelbyville", "Ogdenville"]).unwrap();

    let screened = gatherer
        .screen("Springfield", &indicators(&["I1", "I2", "I3", "I4"]))
        .await
        .unwrap();
    session.set_screened_category("Connectivity", screened);
    assert_eq!(session.indicators.len(), 3);
    assert_eq!(search.calls.load(Ordering::SeqCst), 4);

    let missing = session.missing_cities();
    assert_eq!(missing, vec!["Shelbyville", "Ogdenville"]);
    let gathered = gatherer.gather_many(&missing, &session.indicators).await;
    session.merge_reports(gathered);

    // 4 screening searches plus 3 per remaining city
    assert_eq!(search.calls.load(Ordering::SeqCst), 10);
    let keys: Vec<&str> = session.reports.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Springfield", "Shelbyville", "Ogdenville"]);
    let springfield = &session.reports["Springfield"];
    assert_eq!(springfield.credible().count(), 3);
    assert_eq!(springfield.outcome_for("I3").unwrap().maturity_score(), 4);
}

#[tokio::test]
async fn test_e2e_shared_limit_caps_calls_in_flight() {
    let in_flight = Arc::new(InFlight::default());
    let names = ["I1", "I2", "I3", "I4", "I5", "I6"];
    let scripts: Vec<(&str, Scripted)> = names.iter().map(|n| (*n, found(20, 3, 20))).collect();
    let search = Arc::new(MockSearch::new(&scripts).with_in_flight(in_flight.clone()));
    let model = Arc::new(MockExtractionModel {
        barrier: None,
        in_flight: Some(in_flight.clone()),
        calls: AtomicUsize::new(0),
    });
    let extractor = Arc::new(Extractor::new(model, "gpt-4o"));
    let settings = GatherSettings { max_concurrency: 2, ..GatherSettings::default() };
    let gatherer = Gatherer::new(search.clone(), extractor, &settings);

    let reports = gatherer
        .gather_many(&["Springfield", "Shelbyville", "Capital City"], &indicators(&names))
        .await;

    assert_eq!(reports.len(), 3);
    assert!(reports.values().all(|r| r.credible().count() == names.len()));
    assert_eq!(search.calls.load(Ordering::SeqCst), 18);
    assert_eq!(in_flight.peak.load(Ordering::SeqCst), 2);
    assert_eq!(in_flight.now.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_e2e_panicking_city_does_not_void_others() {
    let search = Arc::new(
        MockSearch::new(&[
            ("I1", found(10, 2, 0)),
            ("I2", found(30, 3, 0)),
            ("I3", found(50, 4, 0)),
            ("I4", found(60, 5, 0)),
        ])
        .panicking_for("Ogdenville"),
    );
    let model = Arc::new(MockExtractionModel::new());
    let gatherer = gatherer(search, model);

    let reports = gatherer
        .gather_many(&["Springfield", "Ogdenville", "Shelbyville"], &indicators(&["I1", "I2", "I3", "I4"]))
        .await;

    let keys: Vec<&str> = reports.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["Springfield", "Ogdenville", "Shelbyville"]);

    let crashed = &reports["Ogdenville"];
    assert_eq!(crashed.len(), 4);
    assert_eq!(crashed.failures().count(), 4);
    match &crashed.outcomes[0] {
        IndicatorOutcome::Failed { city, reason, .. } => {
            assert_eq!(city, "Ogdenville");
            assert!(reason.contains("city task aborted"));
        }
        other => panic!("expected a failed slot, got {:?}", other),
    }

    for city in ["Springfield", "Shelbyville"] {
        assert_eq!(reports[city].credible().count(), 4);
        assert_eq!(reports[city].failures().count(), 0);
    }
}

#[tokio::test]
async fn test_e2e_blank_city_rejected_before_search() {
    let search = Arc::new(MockSearch::new(&[]));
    let model = Arc::new(MockExtractionModel::new());
    let gatherer = gatherer(search.clone(), model);

    let err = gatherer.gather("   ", &indicators(&["I1"])).await.unwrap_err();
    assert!(matches!(err, ToolkitError::InvalidInput(_)));
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
}
