//! Orchestrator Module
//!
//! Coordinates the research pipeline: fan-out gathering across cities and
//! indicators, report drafting, and the session driven by the terminal.

pub mod cli;
pub mod gather;
pub mod report;
pub mod session;

pub use cli::Command;
pub use gather::Gatherer;
pub use report::{load_policy_levers, ReportDrafter, Stakeholders, TocDraft, TocRequest, DEFAULT_MAX_QUERIES};
pub use session::{Session, MAX_CITIES};
