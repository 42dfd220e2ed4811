//! toolgen API gateway: text generation for tool requests
//!
//! The rest of the workspace only sees the `Generator` trait; `ClaudeClient`
//! is the production implementation.

use async_trait::async_trait;
use thiserror::Error;

pub mod claude;
pub mod prompts;

pub use claude::{ClaudeClient, ClaudeConfig};
pub use prompts::TOOL_SYSTEM_PROMPT;

/// Errors from the generation service.
///
/// None of these are retried.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Claude API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("response contained no text")]
    EmptyResponse,
}

impl GenerateError {
    /// True for local misconfiguration, as opposed to upstream failures
    pub fn is_configuration(&self) -> bool {
        matches!(self, GenerateError::MissingApiKey(_))
    }
}

/// Produces raw text for a system instruction and user query
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, system: &str, query: &str) -> Result<String, GenerateError>;
}
