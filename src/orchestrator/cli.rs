//! Command parsing for the terminal front-end.

use super::report::Stakeholders;
use crate::error::{ToolkitError, ToolkitResult};
use crate::indicators::{RankingView, DEFAULT_VIEW_SIZE};

pub const HELP: &str = "\
Commands:
  cities <a, b, ...>        select up to 5 cities (comma-separated)
  country <name>            country used for stakeholders and the report
  categories                list catalog categories
  category <name>           pick a category, keeping indicators with data in the first city
                            (categories outside the catalog are generated)
  indicators                list the current indicators
  view top|bottom [n]       rank by maturity score
  view all                  every indicator with data
  view select <a; b; ...>   only the named indicators
  gather                    gather indicators for every selected city
  report [city]             show the report for a city
  compare                   maturity scores side by side
  levers                    list policy levers
  stakeholders [a, b, ...]  set stakeholders, or generate them when none are given
  toc [structure]           draft the report table of contents
  retoc <changes>           redraft the table of contents with new instructions
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Cities(Vec<String>),
    Country(String),
    Categories,
    Category(String),
    Indicators,
    View(RankingView),
    Gather,
    Report(Option<String>),
    Compare,
    Levers,
    /// `None` asks the model to generate the list.
    Stakeholders(Option<Stakeholders>),
    Toc(String),
    Retoc(String),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> ToolkitResult<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "cities" | "city" => Command::Cities(
                rest.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            "country" => Command::Country(required(word, rest)?.to_string()),
            "categories" => Command::Categories,
            "category" => Command::Category(required(word, rest)?.to_string()),
            "indicators" => Command::Indicators,
            "view" => Command::View(parse_view(rest)?),
            "gather" => Command::Gather,
            "report" => Command::Report(optional(rest).map(str::to_string)),
            "compare" => Command::Compare,
            "levers" => Command::Levers,
            "stakeholders" => Command::Stakeholders(optional(rest).map(Stakeholders::parse_list)),
            "toc" => Command::Toc(rest.to_string()),
            "retoc" => Command::Retoc(required(word, rest)?.to_string()),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => {
                return Err(ToolkitError::InvalidInput(format!(
                    "unknown command '{}', type 'help'",
                    other
                )))
            }
        };
        Ok(command)
    }
}

fn optional(rest: &str) -> Option<&str> {
    Some(rest).filter(|r| !r.is_empty())
}

fn required<'a>(word: &str, rest: &'a str) -> ToolkitResult<&'a str> {
    optional(rest).ok_or_else(|| ToolkitError::InvalidInput(format!("'{}' needs an argument", word)))
}

fn parse_view(rest: &str) -> ToolkitResult<RankingView> {
    let (kind, arg) = match rest.split_once(char::is_whitespace) {
        Some((kind, arg)) => (kind, arg.trim()),
        None => (rest, ""),
    };

    let size = || -> ToolkitResult<usize> {
        match optional(arg) {
            Some(n) => n
                .parse()
                .map_err(|_| ToolkitError::InvalidInput(format!("'{}' is not a number", n))),
            None => Ok(DEFAULT_VIEW_SIZE),
        }
    };

    match kind.to_lowercase().as_str() {
        "" | "top" => Ok(RankingView::Top(size()?)),
        "bottom" => Ok(RankingView::Bottom(size()?)),
        "all" => Ok(RankingView::All),
        "select" => Ok(RankingView::Selected(
            arg.split(';')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        other => Err(ToolkitError::InvalidInput(format!("unknown view '{}'", other))),
    }
}
