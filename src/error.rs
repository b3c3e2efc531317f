//! Error taxonomy shared by every component.

use thiserror::Error;

/// Errors raised by the toolkit core.
#[derive(Debug, Error)]
pub enum ToolkitError {
    /// Missing API key, model name or an unparsable setting.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Provider answered, but not with something usable (non-200, bad JSON, missing fields).
    #[error("provider API error: {0}")]
    Api(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Model content that does not decode into the requested schema.
    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    #[error("indicator catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolkitError {
    /// Whether the retry policy may attempt the call again.
    pub fn is_transient(&self) -> bool {
        match self {
            ToolkitError::Api(_) => true,
            // A builder error means the request could never be sent.
            ToolkitError::Transport(e) => !e.is_builder(),
            _ => false,
        }
    }
}

pub type ToolkitResult<T> = std::result::Result<T, ToolkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ToolkitError::Api("status 500".into()).is_transient());
        assert!(!ToolkitError::InvalidInput("empty".into()).is_transient());
        assert!(!ToolkitError::Config("no key".into()).is_transient());
        assert!(!ToolkitError::MalformedOutput("x".into()).is_transient());
        assert!(!ToolkitError::Catalog("x".into()).is_transient());
    }

    #[test]
    fn test_display_carries_context() {
        let err = ToolkitError::Api("no choices in response".into());
        assert_eq!(err.to_string(), "provider API error: no choices in response");
    }
}
