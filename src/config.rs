use clap::Parser;

use crate::errors::AgentError;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "desktop-agent", about = "Plan-and-execute desktop automation agent")]
pub struct Args {
    /// Port for the web UI (falls back to the next free port above it).
    #[arg(long, default_value_t = 3000)]
    pub port: u16,

    /// Planning model identifier (overrides GEMINI_MODEL).
    #[arg(long)]
    pub model: Option<String>,
}

/// Immutable process-wide configuration, built once at startup and injected
/// where it is needed. Business logic never reads the environment directly.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
}

impl Config {
    pub fn from_env(args: &Args) -> Result<Self, AgentError> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            AgentError::ConfigurationMissing(
                "GEMINI_API_KEY not set; create a .env file with GEMINI_API_KEY=<your key>".into(),
            )
        })?;

        let model = args
            .model
            .clone()
            .or_else(|| std::env::var("GEMINI_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self { api_key, model })
    }
}
