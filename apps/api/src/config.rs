use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::history::DEFAULT_STORAGE_KEY;
use crate::llm_client::gemini::DEFAULT_API_BASE;
use crate::llm_client::{FALLBACK_MODEL, PRIMARY_MODEL};

/// Environment variables that may carry the provider credential, in priority order.
const API_KEY_VARS: [&str; 2] = ["GOOGLE_GENERATIVE_AI_API_KEY", "GEMINI_API_KEY"];

/// Application configuration loaded from environment variables.
/// Nothing is required: a missing credential or Redis URL degrades features, not startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub primary_model: String,
    pub fallback_model: String,
    pub llm_timeout: Duration,
    pub redis_url: Option<String>,
    pub history_storage_key: String,
    pub report_font_path: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let llm_timeout_secs = match non_blank("LLM_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            None => 120,
        };

        Ok(Config {
            gemini_api_key: API_KEY_VARS.iter().find_map(|key| non_blank(*key)),
            gemini_api_base: non_blank("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            primary_model: non_blank("GEMINI_MODEL").unwrap_or_else(|| PRIMARY_MODEL.to_string()),
            fallback_model: non_blank("GEMINI_FALLBACK_MODEL")
                .unwrap_or_else(|| FALLBACK_MODEL.to_string()),
            llm_timeout: Duration::from_secs(llm_timeout_secs),
            redis_url: non_blank("REDIS_URL"),
            history_storage_key: non_blank("HISTORY_STORAGE_KEY")
                .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_string()),
            report_font_path: non_blank("REPORT_FONT_PATH").map(PathBuf::from),
            port: non_blank("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: non_blank("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
