use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Document backend base URL. `None` selects the in-memory gateway.
    pub backend_url: Option<String>,
    pub backend_token: Option<String>,
    pub backend_timeout: Duration,
    /// Entries shown by the collapsed template picker.
    pub default_template_limit: usize,
    /// Editing sessions untouched for this long are dropped.
    pub session_idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            backend_url: None,
            backend_token: None,
            backend_timeout: Duration::from_secs(30),
            default_template_limit: 5,
            session_idle_timeout: Duration::from_secs(3600),
        }
    }
}

impl Config {
    /// How often the idle-session sweeper runs.
    pub fn session_sweep_interval(&self) -> Duration {
        (self.session_idle_timeout / 4).clamp(Duration::from_secs(1), Duration::from_secs(300))
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            backend_url: optional_env("BACKEND_URL"),
            backend_token: optional_env("BACKEND_TOKEN"),
            backend_timeout: Duration::from_secs(parse_env("BACKEND_TIMEOUT_SECS", 30u64)?),
            default_template_limit: parse_env("DEFAULT_TEMPLATE_LIMIT", 5usize)?,
            session_idle_timeout: Duration::from_secs(parse_env("SESSION_IDLE_SECS", 3600u64)?),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
