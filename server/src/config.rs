//! toolgen configuration loading and parsing

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use toolgen_api_gateway::ClaudeConfig;
use toolgen_forge::ProjectLayout;

const DEFAULT_CONFIG_PATH: &str = "toolgen.toml";

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct ToolgenConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generation: ClaudeConfig,
    #[serde(default)]
    pub project: ProjectLayout,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// CORS origins; empty allows any origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_bind() -> String { "0.0.0.0:8080".into() }
fn default_allowed_origins() -> Vec<String> { vec!["http://localhost:3000".into()] }
fn default_log_level() -> String { "info".into() }

/// Config file location: `$TOOLGEN_CONFIG` or `./toolgen.toml`
pub fn config_path() -> PathBuf {
    std::env::var("TOOLGEN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. `$TOOLGEN_PROJECT_ROOT` overrides `project.root`.
pub fn load_config(path: &Path) -> Result<ToolgenConfig> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?
    } else {
        ToolgenConfig::default()
    };

    if let Ok(root) = std::env::var("TOOLGEN_PROJECT_ROOT") {
        if !root.is_empty() {
            config.project.root = PathBuf::from(root);
        }
    }

    Ok(config)
}
