//! Smart City Toolkit
//!
//! Terminal front-end: pick cities and an indicator category, gather
//! indicator data from the web, compare cities, and draft the table of
//! contents of a jobs-and-growth report.

use anyhow::{anyhow, Context, Result};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{error, info};

use smart_city_toolkit::agent::{Extractor, LLMProvider, OpenAICompatibleProvider};
use smart_city_toolkit::config::ToolkitConfig;
use smart_city_toolkit::indicators::{render_city_report, ComparisonTable, IndicatorCatalog, IndicatorGenerator};
use smart_city_toolkit::orchestrator::cli::HELP;
use smart_city_toolkit::orchestrator::{
    load_policy_levers, Command, Gatherer, ReportDrafter, Session,
};
use smart_city_toolkit::tools::{PerplexitySearch, SearchClient};
use smart_city_toolkit::utils::init_logging;

struct App {
    catalog: IndicatorCatalog,
    gatherer: Gatherer,
    generator: IndicatorGenerator,
    drafter: ReportDrafter,
    policy_levers: Vec<String>,
    session: Session,
}

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = ToolkitConfig::from_env().context("Failed to load configuration")?;
    let _log_guard = init_logging(&config.log_dir).context("Failed to initialize logging")?;

    println!("\n{}", "═".repeat(60));
    println!("🏙  Smart City Toolkit v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", "═".repeat(60));

    let search: Arc<dyn SearchClient> = Arc::new(PerplexitySearch::new(config.search.clone())?);
    let llm: Arc<dyn LLMProvider> = Arc::new(OpenAICompatibleProvider::from_settings(&config.llm)?);
    let extractor = Arc::new(Extractor::new(llm.clone(), config.llm.extraction_model.as_str()));

    let catalog = IndicatorCatalog::load(&config.catalog_path)
        .with_context(|| format!("Failed to load indicator catalog from {}", config.catalog_path.display()))?;
    info!("Catalog loaded with {} indicators", catalog.len());
    println!("📚 Catalog: {} indicators in {} categories", catalog.len(), catalog.categories().len());
    println!(
        "🔎 Search model: {} | Extraction: {} | Report: {}",
        config.search.model, config.llm.extraction_model, config.llm.toc_model
    );

    let mut app = App {
        catalog,
        gatherer: Gatherer::new(search, extractor, &config.gather),
        generator: IndicatorGenerator::new(llm.clone(), config.llm.extraction_model.as_str()),
        drafter: ReportDrafter::new(llm, config.llm.toc_model.as_str()),
        policy_levers: load_policy_levers().context("Failed to load policy levers")?,
        session: Session::new(),
    };

    println!("\n💡 Type 'help' for commands, 'quit' to leave.\n");

    loop {
        print!("🏙  > ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        if input.trim().is_empty() {
            continue;
        }

        let command = match Command::parse(&input) {
            Ok(command) => command,
            Err(e) => {
                println!("⚠️  {}\n", e);
                continue;
            }
        };
        if command == Command::Quit {
            println!("\n👋 Goodbye!\n");
            break;
        }

        if let Err(e) = app.dispatch(command).await {
            error!("Command failed: {:#}", e);
            println!("❌ Error: {:#}\n", e);
        }
    }

    Ok(())
}

impl App {
    async fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Cities(names) => {
                self.session.set_cities(&names)?;
                println!("✅ Cities: {}\n", self.session.cities.join(", "));
            }
            Command::Country(country) => {
                self.session.country = Some(country);
            }
            Command::Categories => {
                for category in self.catalog.categories() {
                    println!("   • {}", category);
                }
                println!();
            }
            Command::Category(name) => self.select_category(&name).await?,
            Command::Indicators => {
                if self.session.indicators.is_empty() {
                    println!("No indicators selected. Use 'category <name>'.\n");
                }
                for (i, indicator) in self.session.indicators.iter().enumerate() {
                    println!("{:>3}. {}  [{}]", i + 1, indicator.name, indicator.maturity_scale);
                }
            }
            Command::View(view) => {
                println!("✅ View: {}\n", view);
                self.session.view = view;
            }
            Command::Gather => self.gather().await?,
            Command::Report(city) => {
                let city = city
                    .as_deref()
                    .or_else(|| self.session.primary_city())
                    .ok_or_else(|| anyhow!("no city selected"))?;
                let report = self
                    .session
                    .reports
                    .get(city)
                    .ok_or_else(|| anyhow!("nothing gathered for {} yet, run 'gather'", city))?;
                println!("{}", render_city_report(report, &self.session.view));
            }
            Command::Compare => {
                if self.session.reports.is_empty() {
                    return Err(anyhow!("nothing gathered yet, run 'gather'"));
                }
                let table = ComparisonTable::build(&self.session.indicators, self.session.reports.values());
                println!("{}", table.to_markdown());
            }
            Command::Levers => {
                for lever in &self.policy_levers {
                    println!("   • {}", lever);
                }
                println!();
            }
            Command::Stakeholders(provided) => {
                let stakeholders = match provided {
                    Some(list) => list,
                    None => {
                        let (city, country) = self.city_and_country()?;
                        println!("\n⚙️  Generating stakeholders...\n");
                        self.drafter.generate_stakeholders(&city, &country).await?
                    }
                };
                println!("{}\n", stakeholders.render());
                self.session.stakeholders = Some(stakeholders);
            }
            Command::Toc(hint) => {
                let request = self.session.toc_request(&self.policy_levers, &hint)?;
                println!("\n⚙️  Drafting table of contents...\n");
                let draft = self.drafter.draft_toc(request).await?;
                println!("{}\n", draft.markdown);
                self.session.toc = Some(draft);
            }
            Command::Retoc(hint) => {
                if self.session.toc.is_none() {
                    return Err(anyhow!("no table of contents yet, run 'toc'"));
                }
                let request = self.session.toc_request(&self.policy_levers, &hint)?;
                println!("\n⚙️  Redrafting table of contents...\n");
                let draft = self.drafter.draft_toc(request).await?;
                println!("{}\n", draft.markdown);
                self.session.toc = Some(draft);
            }
            Command::Help => println!("{}\n", HELP),
            Command::Quit => {}
        }
        Ok(())
    }

    /// Catalog categories are used as is, anything else is generated. The
    /// indicators are then checked for data in the first selected city and
    /// that check becomes the city's report.
    async fn select_category(&mut self, name: &str) -> Result<()> {
        let mut candidates = self.catalog.indicators_in(name);
        if candidates.is_empty() {
            println!("\n⚙️  '{}' is not in the catalog, generating indicators...\n", name);
            candidates = self.generator.generate_for_category(name).await?;
        }

        match self.session.primary_city().map(str::to_string) {
            Some(city) => {
                println!("⚙️  Checking {} indicators for data in {}...\n", candidates.len(), city);
                let screened = self.gatherer.screen(&city, &candidates).await?;
                if screened.is_empty() {
                    println!("⚠️  No indicator in '{}' has data for {}\n", name, city);
                }
                self.session.set_screened_category(name, screened);
            }
            None => self.session.set_category(name, candidates),
        }

        println!("✅ {}: {} indicators\n", name, self.session.indicators.len());
        Ok(())
    }

    async fn gather(&mut self) -> Result<()> {
        if self.session.cities.is_empty() {
            return Err(anyhow!("no city selected, use 'cities <a, b>'"));
        }
        if self.session.indicators.is_empty() {
            return Err(anyhow!("no indicators selected, use 'category <name>'"));
        }

        let missing = self.session.missing_cities();
        if missing.is_empty() {
            println!("✅ Every selected city is already gathered, use 'compare' or 'report'\n");
            return Ok(());
        }

        println!(
            "\n⚙️  Gathering {} indicators for {}...\n",
            self.session.indicators.len(),
            missing.join(", ")
        );
        let reports = self
            .gatherer
            .gather_many(&missing, &self.session.indicators)
            .await;

        for report in reports.values() {
            println!(
                "   {} {}: {} with data, {} without, {} failed",
                if report.failures().count() == 0 { "✓" } else { "⚠️" },
                report.city,
                report.credible().count(),
                report.results().filter(|r| !r.is_credible()).count(),
                report.failures().count()
            );
        }
        println!();
        self.session.merge_reports(reports);
        Ok(())
    }

    fn city_and_country(&self) -> Result<(String, String)> {
        let city = self
            .session
            .primary_city()
            .ok_or_else(|| anyhow!("no city selected, use 'cities <name>'"))?;
        let country = self
            .session
            .country
            .as_deref()
            .ok_or_else(|| anyhow!("no country set, use 'country <name>'"))?;
        Ok((city.to_string(), country.to_string()))
    }
}
