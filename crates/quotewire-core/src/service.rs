//! Market operations over a [`ChartSource`].
//!
//! Each operation resolves its date window, issues one chart call per symbol
//! and hands back normalized domain values. Rendering is left to the caller.

use std::sync::Arc;

use futures::future::try_join_all;
use time::OffsetDateTime;
use tracing::debug;

use crate::adapters::YahooChartSource;
use crate::budget::RequestBudget;
use crate::config::MarketConfig;
use crate::data_source::{ChartRequest, ChartSource, SourceError, SourceErrorKind};
use crate::fetcher::ResilientFetcher;
use crate::http_client::ReqwestHttpClient;
use crate::normalize::SeriesNormalizer;
use crate::report::ReportFormatter;
use crate::{Interval, OhlcvRecord, Period, QuoteSnapshot, Symbol, ValidationError};

/// Benchmarks reported by [`MarketService::market_indices`], in display order.
pub const MARKET_INDICES: [(&str, &str); 5] = [
    ("S&P 500", "^GSPC"),
    ("Dow Jones Industrial", "^DJI"),
    ("NASDAQ Composite", "^IXIC"),
    ("Russell 2000", "^RUT"),
    ("CBOE Volatility (VIX)", "^VIX"),
];

pub const MIN_COMPARE_SYMBOLS: usize = 2;
pub const MAX_COMPARE_SYMBOLS: usize = 10;

/// Lookback used for quote lookups; only the metadata is read.
const QUOTE_PERIOD: Period = Period::FiveDays;

#[derive(Clone)]
pub struct MarketService {
    source: Arc<dyn ChartSource>,
    normalizer: SeriesNormalizer,
    formatter: ReportFormatter,
    now: fn() -> OffsetDateTime,
}

impl MarketService {
    pub fn new(source: Arc<dyn ChartSource>) -> Self {
        Self {
            source,
            normalizer: SeriesNormalizer,
            formatter: ReportFormatter,
            now: OffsetDateTime::now_utc,
        }
    }

    /// Production wiring: reqwest transport, retrying fetcher, shared budget.
    pub fn from_config(config: &MarketConfig) -> Self {
        let fetcher = ResilientFetcher::new(Arc::new(ReqwestHttpClient::new()), config.retry())
            .with_timeout_ms(config.timeout_ms);
        let budget = Arc::new(RequestBudget::new(config.budget));
        Self::new(Arc::new(YahooChartSource::new(
            config.base_url.clone(),
            budget,
            fetcher,
        )))
    }

    /// Overrides the wall clock used to anchor date windows.
    pub fn with_now(mut self, now: fn() -> OffsetDateTime) -> Self {
        self.now = now;
        self
    }

    pub fn formatter(&self) -> &ReportFormatter {
        &self.formatter
    }

    pub async fn quote(&self, symbol: &Symbol) -> Result<QuoteSnapshot, SourceError> {
        let now = (self.now)();
        let request = ChartRequest::new(symbol.clone(), QUOTE_PERIOD.start(now), now, Interval::OneDay)?;
        let payload = self.source.chart(request).await?;
        Ok(self.normalizer.quote(payload.meta))
    }

    /// Chart for `symbol` over `period`, one record per upstream timestamp.
    ///
    /// An upstream "no data" answer and an empty series both come back as
    /// `NoData` naming the symbol, period and interval.
    pub async fn history(
        &self,
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<OhlcvRecord>, SourceError> {
        let now = (self.now)();
        let request = ChartRequest::new(symbol.clone(), period.start(now), now, interval)?;

        let records = self
            .source
            .chart(request)
            .await
            .and_then(|payload| self.normalizer.normalize(&payload))
            .map_err(|error| match error.kind() {
                SourceErrorKind::NoData => SourceError::no_data(format!(
                    "No data found for {symbol} (period: {period}, interval: {interval})"
                )),
                _ => error,
            })?;

        debug!(symbol = %symbol, records = records.len(), "history normalized");
        Ok(records)
    }

    /// Quotes every entry of [`MARKET_INDICES`]; any failure fails the batch.
    pub async fn market_indices(&self) -> Result<Vec<(&'static str, QuoteSnapshot)>, SourceError> {
        let symbols = MARKET_INDICES
            .iter()
            .map(|(name, ticker)| Symbol::parse(ticker).map(|symbol| (*name, symbol)))
            .collect::<Result<Vec<_>, ValidationError>>()?;

        try_join_all(symbols.iter().map(|(name, symbol)| async move {
            self.quote(symbol).await.map(|quote| (*name, quote))
        }))
        .await
    }

    /// Quotes 2 to 10 symbols concurrently, preserving input order.
    pub async fn compare(&self, symbols: &[Symbol]) -> Result<Vec<QuoteSnapshot>, SourceError> {
        if !(MIN_COMPARE_SYMBOLS..=MAX_COMPARE_SYMBOLS).contains(&symbols.len()) {
            return Err(ValidationError::SymbolCount {
                count: symbols.len(),
                min: MIN_COMPARE_SYMBOLS,
                max: MAX_COMPARE_SYMBOLS,
            }
            .into());
        }

        try_join_all(symbols.iter().map(|symbol| self.quote(symbol))).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use time::macros::datetime;

    use super::*;
    use crate::{ChartMeta, RawSeriesPayload};

    #[derive(Default)]
    struct ScriptedChartSource {
        payloads: HashMap<String, Result<RawSeriesPayload, SourceError>>,
        requests: Mutex<Vec<ChartRequest>>,
    }

    impl ScriptedChartSource {
        fn with(mut self, symbol: &str, outcome: Result<RawSeriesPayload, SourceError>) -> Self {
            self.payloads.insert(symbol.to_owned(), outcome);
            self
        }

        fn requests(&self) -> Vec<ChartRequest> {
            self.requests.lock().expect("request log is not poisoned").clone()
        }
    }

    impl ChartSource for ScriptedChartSource {
        fn chart<'a>(
            &'a self,
            req: ChartRequest,
        ) -> Pin<Box<dyn Future<Output = Result<RawSeriesPayload, SourceError>> + Send + 'a>> {
            let outcome = self
                .payloads
                .get(req.symbol.as_str())
                .cloned()
                .unwrap_or_else(|| Err(SourceError::no_data("unscripted symbol")));
            self.requests
                .lock()
                .expect("request log is not poisoned")
                .push(req);
            Box::pin(async move { outcome })
        }
    }

    fn fixed_now() -> OffsetDateTime {
        datetime!(2024-02-01 21:00:00 UTC)
    }

    fn meta(symbol: &str, price: f64, previous: f64) -> RawSeriesPayload {
        RawSeriesPayload {
            meta: ChartMeta {
                symbol: symbol.to_owned(),
                regular_market_price: Some(price),
                previous_close: Some(previous),
                ..ChartMeta::default()
            },
            ..RawSeriesPayload::default()
        }
    }

    fn service(source: Arc<ScriptedChartSource>) -> MarketService {
        MarketService::new(source).with_now(fixed_now)
    }

    #[tokio::test]
    async fn quote_uses_five_day_daily_window() {
        let source = Arc::new(ScriptedChartSource::default().with("MSFT", Ok(meta("MSFT", 110.0, 100.0))));

        let quote = service(source.clone())
            .quote(&Symbol::parse("msft").expect("valid"))
            .await
            .expect("quote");

        assert_eq!(quote.change, Some(10.0));
        let requests = source.requests();
        assert_eq!(requests[0].start, datetime!(2024-01-27 21:00:00 UTC));
        assert_eq!(requests[0].end, fixed_now());
        assert_eq!(requests[0].interval, Interval::OneDay);
    }

    #[tokio::test]
    async fn history_reports_missing_series_with_request_context() {
        let source = Arc::new(ScriptedChartSource::default().with("ZZZZ", Ok(meta("ZZZZ", 1.0, 1.0))));

        let error = service(source)
            .history(&Symbol::parse("ZZZZ").expect("valid"), Period::ThreeMonths, Interval::OneWeek)
            .await
            .expect_err("empty series");

        assert_eq!(error.kind(), SourceErrorKind::NoData);
        assert_eq!(error.message(), "No data found for ZZZZ (period: 3mo, interval: 1wk)");
    }

    #[tokio::test]
    async fn indices_fan_out_in_display_order() {
        let mut source = ScriptedChartSource::default();
        for (_, ticker) in MARKET_INDICES {
            source = source.with(ticker, Ok(meta(ticker, 2.0, 1.0)));
        }
        let source = Arc::new(source);

        let rows = service(source.clone()).market_indices().await.expect("all succeed");

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].0, "S&P 500");
        assert_eq!(rows[4].1.meta.symbol, "^VIX");
        assert_eq!(source.requests().len(), 5);
    }

    #[tokio::test]
    async fn compare_enforces_symbol_count() {
        let source = Arc::new(ScriptedChartSource::default());
        let one = vec![Symbol::parse("AAPL").expect("valid")];

        let error = service(source.clone()).compare(&one).await.expect_err("too few");

        assert_eq!(error.kind(), SourceErrorKind::InvalidParameter);
        assert!(source.requests().is_empty());
    }
}
