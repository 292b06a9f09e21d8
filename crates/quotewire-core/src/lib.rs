//! # Quotewire Core
//!
//! Resilient market-data layer behind the quotewire tools.
//!
//! ## Overview
//!
//! - **Request budget** with fixed per-minute and per-day windows, charged
//!   before every outbound chart call
//! - **Resilient fetcher** retrying transport faults and upstream throttling
//!   with exponential backoff
//! - **Series normalizer** turning parallel-array chart payloads into ordered
//!   OHLCV records with explicit unknowns
//! - **Report formatter** producing deterministic, sampled text tables
//! - **Tool boundary** that validates primitive arguments and flattens every
//!   outcome to text
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo Finance chart source |
//! | [`budget`] | Fixed-window request budget |
//! | [`clock`] | Injectable monotonic clock |
//! | [`config`] | Defaults and `QUOTEWIRE_*` environment overrides |
//! | [`data_source`] | Chart source trait and structured errors |
//! | [`domain`] | Symbol, period, interval and series models |
//! | [`error`] | Validation and configuration errors |
//! | [`fetcher`] | Retrying GET |
//! | [`http_client`] | HTTP client abstraction |
//! | [`normalize`] | Chart decoding and normalization |
//! | [`report`] | Text rendering |
//! | [`retry`] | Backoff policy and sleepers |
//! | [`service`] | Market operations |
//! | [`tools`] | Tool call dispatch |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quotewire_core::{dispatch, MarketConfig, MarketService, ToolCall};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = MarketService::from_config(&MarketConfig::from_env()?);
//!     let call = ToolCall::HistoricalData {
//!         symbol: "AAPL".into(),
//!         period: Some("1mo".into()),
//!         interval: None,
//!     };
//!     println!("{}", dispatch(&service, call).await);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  ToolCall       │  validate symbol / period / interval
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ MarketService   │────▶│ ReportFormatter  │
//! └────────┬────────┘     └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ YahooChartSource│────▶│ RequestBudget    │
//! └────────┬────────┘     └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ResilientFetcher │────▶│ HttpClient       │
//! └────────┬────────┘     └──────────────────┘
//!          ▼
//! ┌─────────────────┐
//! │ SeriesNormalizer│
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Internally every failure is a [`SourceError`]; only [`dispatch`] turns
//! it into `Error:` text.
//!
//! ```rust
//! use quotewire_core::{SourceError, SourceErrorKind};
//!
//! fn is_worth_retrying_later(error: &SourceError) -> bool {
//!     matches!(
//!         error.kind(),
//!         SourceErrorKind::RateLimited | SourceErrorKind::ExhaustedRetries
//!     )
//! }
//! ```

pub mod adapters;
pub mod budget;
pub mod clock;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod normalize;
pub mod report;
pub mod retry;
pub mod service;
pub mod tools;

// Adapter implementations
pub use adapters::{YahooChartSource, DEFAULT_BASE_URL};

// Budget
pub use budget::{
    BudgetConfig, BudgetDecision, BudgetSnapshot, BudgetWindow, RequestBudget, DAY_WINDOW,
    MINUTE_WINDOW,
};

pub use clock::{Clock, ManualClock, SystemClock};

pub use config::MarketConfig;

// Chart source trait and types
pub use data_source::{ChartRequest, ChartSource, SourceError, SourceErrorKind};

// Domain models
pub use domain::{ChartMeta, Interval, OhlcvRecord, Period, QuoteSnapshot, RawSeriesPayload, Symbol};

// Error types
pub use error::{ConfigError, ValidationError};

pub use fetcher::{ResilientFetcher, MAX_RETRIES_EXCEEDED};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

pub use normalize::SeriesNormalizer;

pub use report::{PriceChange, ReportFormatter, SampledReport};

// Retry logic
pub use retry::{Backoff, RecordingSleeper, RetryConfig, Sleeper, TokioSleeper};

pub use service::{MarketService, MARKET_INDICES};

pub use tools::{dispatch, error_text, is_error_text, ToolCall};
