use super::ranking::RankingView;
use super::types::{CityReport, IndicatorOutcome};

/// Markdown report for one city: the ranked view, then a note on what is
/// missing.
pub fn render_city_report(report: &CityReport, view: &RankingView) -> String {
    let mut out = format!("# {}\n\n_{}_\n", report.city, view);

    let ranked = report.ranked(view);
    if ranked.is_empty() {
        out.push_str("\nNo indicators with credible data.\n");
    }

    for result in ranked {
        out.push_str(&format!(
            "\n## {}\n\n### Maturity Score: {}\n\n### Output Text\n\n{}\n",
            result.indicator.name,
            result.maturity_score(),
            result.raw_text.trim()
        ));
        if !result.citations.is_empty() {
            out.push_str("\n### Sources\n\n");
            for (i, url) in result.citations.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, url));
            }
        }
    }

    let unknown: Vec<&str> = report
        .results()
        .filter(|r| !r.is_credible())
        .map(|r| r.indicator.name.as_str())
        .collect();
    if !unknown.is_empty() {
        out.push_str(&format!("\n## No Data Found\n\n{}\n", unknown.join(", ")));
    }

    let failures: Vec<String> = report
        .failures()
        .filter_map(|o| match o {
            IndicatorOutcome::Failed { indicator, reason, .. } => {
                Some(format!("- {}: {}", indicator.name, reason))
            }
            IndicatorOutcome::Completed(_) => None,
        })
        .collect();
    if !failures.is_empty() {
        out.push_str(&format!("\n## Failed\n\n{}\n", failures.join("\n")));
    }

    out
}
