//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "urlguard-server")]
#[command(about = "URLGuard URL classification service", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Path to the classifier artifact
    #[arg(short, long, env = "URLGUARD_MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Default Gemini API key, used when a request does not carry one
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Load the model on first request instead of at startup
    #[arg(long)]
    pub lazy_model: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
