//! Runtime configuration.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `QUOTEWIRE_BASE_URL` | `https://query1.finance.yahoo.com` | Chart API host |
//! | `QUOTEWIRE_MINUTE_LIMIT` | `20` | Outbound calls per 60 s |
//! | `QUOTEWIRE_DAILY_LIMIT` | `500` | Outbound calls per 24 h |
//! | `QUOTEWIRE_MAX_RETRIES` | `3` | HTTP attempts per logical fetch |
//! | `QUOTEWIRE_TIMEOUT_MS` | `10000` | Transport timeout per attempt |

use std::str::FromStr;
use std::time::Duration;

use crate::adapters::DEFAULT_BASE_URL;
use crate::budget::BudgetConfig;
use crate::error::ConfigError;
use crate::retry::RetryConfig;

pub const ENV_BASE_URL: &str = "QUOTEWIRE_BASE_URL";
pub const ENV_MINUTE_LIMIT: &str = "QUOTEWIRE_MINUTE_LIMIT";
pub const ENV_DAILY_LIMIT: &str = "QUOTEWIRE_DAILY_LIMIT";
pub const ENV_MAX_RETRIES: &str = "QUOTEWIRE_MAX_RETRIES";
pub const ENV_TIMEOUT_MS: &str = "QUOTEWIRE_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq)]
pub struct MarketConfig {
    pub base_url: String,
    pub budget: BudgetConfig,
    pub max_retries: u32,
    /// First backoff delay; doubles on each further attempt.
    pub backoff_base: Duration,
    pub timeout_ms: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            budget: BudgetConfig::default(),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            timeout_ms: 10_000,
        }
    }
}

impl MarketConfig {
    /// Defaults overridden by any `QUOTEWIRE_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url.trim().to_owned();
        }
        if let Some(value) = parse_var(&lookup, ENV_MINUTE_LIMIT)? {
            config.budget.minute_capacity = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_DAILY_LIMIT)? {
            config.budget.day_capacity = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_MAX_RETRIES)? {
            config.max_retries = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_TIMEOUT_MS)? {
            config.timeout_ms = value;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl {
                value: self.base_url.clone(),
            });
        }
        if self.budget.minute_capacity == 0 {
            return Err(ConfigError::Zero { field: "minute limit" });
        }
        if self.budget.day_capacity == 0 {
            return Err(ConfigError::Zero { field: "daily limit" });
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Zero { field: "max retries" });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Zero { field: "timeout" });
        }
        Ok(())
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::exponential(self.max_retries, self.backoff_base)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::InvalidEnv {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        })
}
