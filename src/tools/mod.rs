//! Tool System Module
//!
//! External research tools. Currently the conversational web search used to
//! collect indicator data.

mod web_search;

pub use web_search::{PerplexitySearch, SearchClient, SearchHit};
