//! CLI argument definitions for quotewire.
//!
//! # Commands
//!
//! | Command | Tool |
//! |---------|------|
//! | `quote` | `get_stock_quote` |
//! | `history` | `get_historical_data` |
//! | `indices` | `get_market_indices` |
//! | `compare` | `compare_stocks` |
//!
//! # Global Options
//!
//! Each option falls back to its `QUOTEWIRE_*` variable, read through
//! [`MarketConfig::from_lookup`], and then to the default.
//!
//! | Option | Env | Default |
//! |--------|-----|---------|
//! | `--timeout-ms` | `QUOTEWIRE_TIMEOUT_MS` | `10000` |
//! | `--max-retries` | `QUOTEWIRE_MAX_RETRIES` | `3` |
//! | `--minute-limit` | `QUOTEWIRE_MINUTE_LIMIT` | `20` |
//! | `--daily-limit` | `QUOTEWIRE_DAILY_LIMIT` | `500` |
//! | `--base-url` | `QUOTEWIRE_BASE_URL` | `https://query1.finance.yahoo.com` |
//!
//! # Examples
//!
//! ```bash
//! quotewire quote AAPL
//! quotewire history AAPL --period 3mo --interval 1wk
//! quotewire indices
//! quotewire compare AAPL MSFT GOOGL
//! ```

use clap::{Args, Parser, Subcommand};
use quotewire_core::config::{
    ENV_BASE_URL, ENV_DAILY_LIMIT, ENV_MAX_RETRIES, ENV_MINUTE_LIMIT, ENV_TIMEOUT_MS,
};
use quotewire_core::{ConfigError, MarketConfig};

/// Market data from the Yahoo Finance chart API, rendered as plain text.
#[derive(Debug, Parser)]
#[command(
    name = "quotewire",
    author,
    version,
    about = "Rate-limited market data lookups rendered as plain text"
)]
pub struct Cli {
    /// Transport timeout per attempt, in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// HTTP attempts per chart call, including the first.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Outbound chart calls allowed per 60 seconds.
    #[arg(long, global = true)]
    pub minute_limit: Option<u32>,

    /// Outbound chart calls allowed per 24 hours.
    #[arg(long, global = true)]
    pub daily_limit: Option<u32>,

    /// Chart API host.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Flags over `QUOTEWIRE_*` variables over defaults.
    pub fn market_config(&self) -> Result<MarketConfig, ConfigError> {
        self.market_config_with(|name| std::env::var(name).ok())
    }

    /// Same as [`market_config`](Self::market_config) with an explicit variable source.
    pub fn market_config_with<F>(&self, env: F) -> Result<MarketConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        MarketConfig::from_lookup(|name| self.flag_value(name).or_else(|| env(name)))
    }

    fn flag_value(&self, name: &str) -> Option<String> {
        match name {
            ENV_TIMEOUT_MS => self.timeout_ms.map(|value| value.to_string()),
            ENV_MAX_RETRIES => self.max_retries.map(|value| value.to_string()),
            ENV_MINUTE_LIMIT => self.minute_limit.map(|value| value.to_string()),
            ENV_DAILY_LIMIT => self.daily_limit.map(|value| value.to_string()),
            ENV_BASE_URL => self.base_url.clone(),
            _ => None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Current price, change and session metadata for one symbol.
    ///
    ///   quotewire quote AAPL
    ///   quotewire quote ^GSPC
    Quote(QuoteArgs),

    /// Sampled OHLCV table with the period's price change.
    ///
    ///   quotewire history AAPL
    ///   quotewire history TSLA --period 1y --interval 1wk
    History(HistoryArgs),

    /// S&P 500, Dow Jones, NASDAQ, Russell 2000 and VIX.
    Indices,

    /// Quote blocks for 2 to 10 symbols.
    ///
    ///   quotewire compare AAPL MSFT GOOGL
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Ticker symbol (e.g. AAPL, ^GSPC, EURUSD=X).
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    pub symbol: String,

    /// 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd or max (default 1mo).
    #[arg(long)]
    pub period: Option<String>,

    /// 1m, 2m, 5m, 15m, 30m, 60m, 90m, 1h, 1d, 5d, 1wk, 1mo or 3mo (default 1d).
    #[arg(long)]
    pub interval: Option<String>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,
}
