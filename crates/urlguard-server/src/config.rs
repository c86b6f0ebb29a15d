//! Server configuration

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use urlguard_core::{Error, Result};
use urlguard_reasoning::{GeminiConfig, ReasoningSettings, DEFAULT_PROMPT_TEMPLATE};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Classifier artifact path; `~` expands to the home directory
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Load the model before accepting requests
    #[serde(default = "default_true")]
    pub preload_model: bool,

    /// Remote reasoning configuration
    #[serde(default)]
    pub gemini: GeminiSection,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)
                .map_err(|e| Error::config(format!("invalid config {}: {}", config_path, e)))?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }

        if let Some(port) = cli.port {
            config.port = port;
        }

        if let Some(model) = &cli.model {
            config.model_path = model.clone();
        }

        if let Some(key) = &cli.gemini_api_key {
            config.gemini.api_key = Some(key.clone());
        }

        if cli.lazy_model {
            config.preload_model = false;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.listen, self.port)
            .parse()
            .map_err(|e| Error::config(format!("invalid listen address: {}", e)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            model_path: default_model_path(),
            preload_model: true,
            gemini: GeminiSection::default(),
        }
    }
}

/// Remote reasoning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiSection {
    /// Default API key; requests may override it with a header
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Deadline for one remote call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// File holding a prompt template that replaces the built-in one
    #[serde(default)]
    pub prompt_template_path: Option<PathBuf>,

    #[serde(flatten)]
    pub api: GeminiConfig,
}

impl GeminiSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Settings for the reasoning service, reading the template file if set
    pub fn reasoning_settings(&self) -> Result<ReasoningSettings> {
        let prompt_template = match &self.prompt_template_path {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                Error::config(format!(
                    "cannot read prompt template {}: {}",
                    path.display(),
                    e
                ))
            })?,
            None => DEFAULT_PROMPT_TEMPLATE.to_string(),
        };

        Ok(ReasoningSettings {
            default_api_key: self.api_key.clone(),
            timeout: self.timeout(),
            prompt_template,
        })
    }
}

impl Default for GeminiSection {
    fn default() -> Self {
        Self {
            api_key: None,
            timeout_secs: default_timeout_secs(),
            prompt_template_path: None,
            api: GeminiConfig::default(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model/url_classifier.json")
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}
