//! Agent Module
//!
//! Language-model access: the provider trait with its HTTP implementation,
//! the chat wire types, and the extraction step built on top of them.

mod extraction;
mod provider;
mod types;

pub use extraction::{decode_json, decode_score, Extractor, MaturityScore, MAX_MATURITY};
pub use provider::{LLMProvider, OpenAICompatibleProvider};
pub use types::{ChatMessage, ChatRequest, OutputSchema, Role};
