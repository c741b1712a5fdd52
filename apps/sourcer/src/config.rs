use std::time::Duration;

use anyhow::{Context, Result};

use crate::admission::RateLimits;

/// Application configuration loaded from environment variables. Everything
/// has a sensible default; the service runs with no environment at all
/// (in-memory state, AI paths disabled).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Absent key disables the AI scoring and parsing paths entirely.
    pub gemini_api_key: Option<String>,
    /// Default AI preference for requests that don't specify one.
    pub use_ai: bool,
    /// JSON document path. Absent means in-memory state only.
    pub storage_path: Option<String>,
    pub max_requests_per_minute: usize,
    pub min_request_interval: Duration,
    pub max_requests_per_day: usize,
    pub min_action_interval: Duration,
    pub debounce_quiet_period: Duration,
    pub exclusion_penalty: u32,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let use_ai = match std::env::var("USE_AI") {
            Ok(raw) => raw == "1" || raw.eq_ignore_ascii_case("true"),
            Err(_) => gemini_api_key.is_some(),
        };

        Ok(Config {
            port: env_parse("PORT", 8080)?,
            use_ai,
            gemini_api_key,
            storage_path: std::env::var("STORAGE_PATH").ok(),
            max_requests_per_minute: env_parse("MAX_REQUESTS_PER_MINUTE", 12)?,
            min_request_interval: Duration::from_secs(env_parse("MIN_REQUEST_INTERVAL_SECS", 5)?),
            max_requests_per_day: env_parse("MAX_REQUESTS_PER_DAY", 1400)?,
            min_action_interval: Duration::from_secs(env_parse("MIN_ACTION_INTERVAL_SECS", 5)?),
            debounce_quiet_period: Duration::from_secs(env_parse("DEBOUNCE_QUIET_SECS", 2)?),
            exclusion_penalty: env_parse("EXCLUSION_PENALTY", 20)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn rate_limits(&self) -> RateLimits {
        RateLimits {
            max_per_minute: self.max_requests_per_minute,
            min_interval: self.min_request_interval,
            max_per_day: self.max_requests_per_day,
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value")),
        Err(_) => Ok(default),
    }
}
