//! Remote reasoning errors
//!
//! None of these reach callers of the prediction API directly; they become
//! the `reasoning` text of a fallback verdict.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("Gemini API key not configured")]
    MissingApiKey,

    #[error("remote reasoning support is not compiled in")]
    Unavailable,

    #[error("request to remote reasoning service failed: {0}")]
    Http(String),

    #[error("remote reasoning service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("remote reasoning request timed out after {0:?}")]
    Timeout(Duration),

    #[error("No text response from Gemini API")]
    EmptyResponse,

    #[error("Failed to parse Gemini API response as JSON: {0}")]
    Parse(String),
}

impl ReasoningError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Short machine-readable name, used for metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing_api_key",
            Self::Unavailable => "unavailable",
            Self::Http(_) => "http",
            Self::Status { .. } => "status",
            Self::Timeout(_) => "timeout",
            Self::EmptyResponse => "empty_response",
            Self::Parse(_) => "parse",
        }
    }
}

#[cfg(feature = "gemini")]
impl From<reqwest::Error> for ReasoningError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}
