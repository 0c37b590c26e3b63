// config.rs
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{AppError, Result};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api/v1";

/// Timing of the order status confirmation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
    pub redirect_delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 12,
            redirect_delay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub store_path: PathBuf,
    pub http_timeout: Duration,
    pub poll: PollSettings,
    pub log_level: tracing::Level,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            store_path: PathBuf::from("hima-store.json"),
            http_timeout: Duration::from_secs(30),
            poll: PollSettings::default(),
            log_level: tracing::Level::INFO,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source; unset keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("HIMA_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(AppError::configuration(format!(
                "HIMA_API_BASE_URL must be an http(s) URL, got {}",
                api_base_url
            )));
        }

        let store_path = lookup("HIMA_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.store_path);

        let http_timeout = parse_secs(&lookup, "HIMA_HTTP_TIMEOUT_SECS")?
            .unwrap_or(defaults.http_timeout);

        let interval = parse_secs(&lookup, "HIMA_POLL_INTERVAL_SECS")?
            .unwrap_or(defaults.poll.interval);
        let max_attempts = parse_var::<u32, _>(&lookup, "HIMA_POLL_MAX_ATTEMPTS")?
            .unwrap_or(defaults.poll.max_attempts);
        if max_attempts == 0 {
            return Err(AppError::configuration(
                "HIMA_POLL_MAX_ATTEMPTS must be at least 1",
            ));
        }
        let redirect_delay = parse_secs(&lookup, "HIMA_REDIRECT_DELAY_SECS")?
            .unwrap_or(defaults.poll.redirect_delay);

        let log_level = parse_var::<tracing::Level, _>(&lookup, "HIMA_LOG_LEVEL")?
            .unwrap_or(defaults.log_level);

        Ok(AppConfig {
            api_base_url,
            store_path,
            http_timeout,
            poll: PollSettings {
                interval,
                max_attempts,
                redirect_delay,
            },
            log_level,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "api_base_url": self.api_base_url,
            "store_path": self.store_path.display().to_string(),
            "http_timeout_secs": self.http_timeout.as_secs(),
            "poll_interval_secs": self.poll.interval.as_secs(),
            "poll_max_attempts": self.poll.max_attempts,
            "redirect_delay_secs": self.poll.redirect_delay.as_secs(),
            "log_level": self.log_level.to_string(),
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::configuration(format!("{} is invalid ({}): {}", key, raw, e))),
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_var::<u64, _>(lookup, key)?.map(Duration::from_secs))
}
