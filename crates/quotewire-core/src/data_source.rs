//! Chart source trait and the structured error shared across the core.
//!
//! The service layer talks to upstream market data only through
//! [`ChartSource`]; the production implementation is
//! [`YahooChartSource`](crate::adapters::YahooChartSource).

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use time::OffsetDateTime;

use crate::budget::BudgetWindow;
use crate::{Interval, RawSeriesPayload, Symbol, ValidationError};

/// Error classification used by the tool boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Local request budget exhausted.
    RateLimited,
    /// Transport or upstream throttling persisted through every attempt.
    ExhaustedRetries,
    InvalidParameter,
    /// Upstream answered but has no series for the request.
    NoData,
    /// Upstream answered with a non-success status other than 429.
    Upstream,
    Internal,
}

/// Structured source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn rate_limited(window: BudgetWindow) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: format!(
                "Rate limit exceeded ({} request budget exhausted). Please try again later.",
                window.as_str()
            ),
            retryable: true,
        }
    }

    pub fn exhausted_retries(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::ExhaustedRetries,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidParameter,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NoData,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn upstream(status: u16, detail: Option<&str>) -> Self {
        let message = match detail {
            Some(detail) => format!("upstream returned status {status}: {detail}"),
            None => format!("upstream returned status {status}"),
        };
        Self {
            kind: SourceErrorKind::Upstream,
            message,
            retryable: status >= 500,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::ExhaustedRetries => "source.exhausted_retries",
            SourceErrorKind::InvalidParameter => "source.invalid_parameter",
            SourceErrorKind::NoData => "source.no_data",
            SourceErrorKind::Upstream => "source.upstream",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_parameter(error.to_string())
    }
}

/// One chart lookup: a symbol over an absolute `[start, end]` window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub symbol: Symbol,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub interval: Interval,
}

impl ChartRequest {
    pub fn new(
        symbol: Symbol,
        start: OffsetDateTime,
        end: OffsetDateTime,
        interval: Interval,
    ) -> Result<Self, SourceError> {
        if start > end {
            return Err(SourceError::invalid_parameter(
                "chart window start must not be after its end",
            ));
        }
        Ok(Self {
            symbol,
            start,
            end,
            interval,
        })
    }
}

/// Upstream chart contract.
///
/// Implementations are responsible for charging the request budget before
/// each outbound call.
pub trait ChartSource: Send + Sync {
    fn chart<'a>(
        &'a self,
        req: ChartRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawSeriesPayload, SourceError>> + Send + 'a>>;
}
