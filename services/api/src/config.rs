use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub bind: String,
    pub refresh_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            api_key: var("API_KEY")
                .filter(|key| !key.trim().is_empty())
                .context("API_KEY env var missing or blank")?,
            model: var("ANALYSIS_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            base_url: var("ANALYSIS_BASE_URL").unwrap_or_else(|| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            request_timeout: Duration::from_secs(
                var("ANALYSIS_TIMEOUT_SECS")
                    .unwrap_or_else(|| "120".to_string())
                    .parse()
                    .unwrap_or(120),
            ),
            bind: var("API_BIND").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            refresh_interval: Duration::from_secs(
                var("REFRESH_INTERVAL_SECS")
                    .unwrap_or_else(|| "60".to_string())
                    .parse()
                    .unwrap_or(60),
            ),
        })
    }
}
