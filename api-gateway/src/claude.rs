//! Claude API client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::{GenerateError, Generator};

/// Connection settings for the Anthropic Messages API
#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Environment variable holding the API key, read on every request
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_key_env: default_api_key_env(),
            api_version: default_api_version(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String { "https://api.anthropic.com".into() }
fn default_model() -> String { "claude-3-5-sonnet-20240620".into() }
fn default_max_tokens() -> u32 { 4096 }
fn default_api_key_env() -> String { "ANTHROPIC_API_KEY".into() }
fn default_api_version() -> String { "2023-06-01".into() }
fn default_timeout() -> u64 { 300 }

/// Claude API client
pub struct ClaudeClient {
    client: reqwest::Client,
    config: ClaudeConfig,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeContent>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: ClaudeUsage,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct ClaudeUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl ClaudeClient {
    pub fn new(config: ClaudeConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            config,
        }
    }

    /// Get the model name this client is configured for
    pub fn model_name(&self) -> &str {
        &self.config.model
    }

    pub fn is_available(&self) -> bool {
        self.api_key().is_ok()
    }

    fn api_key(&self) -> Result<String, GenerateError> {
        std::env::var(&self.config.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| GenerateError::MissingApiKey(self.config.api_key_env.clone()))
    }
}

#[async_trait]
impl Generator for ClaudeClient {
    async fn generate(&self, system: &str, query: &str) -> Result<String, GenerateError> {
        let api_key = self.api_key()?;

        let request_body = ClaudeRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system,
            messages: vec![ClaudeMessage {
                role: "user",
                content: query,
            }],
        };

        let start = std::time::Instant::now();

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &api_key)
            .header("anthropic-version", &self.config.api_version)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let latency = start.elapsed().as_millis();

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api { status, body });
        }

        let claude_response: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::InvalidResponse(e.to_string()))?;

        info!(
            "Claude response from {}: {} tokens, {}ms latency",
            claude_response.model,
            claude_response.usage.input_tokens + claude_response.usage.output_tokens,
            latency
        );

        let text = claude_response
            .content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text)
            .ok_or(GenerateError::EmptyResponse)?;

        debug!("API response: {text}");
        Ok(text)
    }
}
