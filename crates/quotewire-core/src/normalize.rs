//! Chart payload decoding and normalization.
//!
//! [`decode_chart`] turns the upstream JSON body into a [`RawSeriesPayload`];
//! [`SeriesNormalizer`] turns that into positional [`OhlcvRecord`]s and
//! derives quote change figures.

use serde::Deserialize;
use time::OffsetDateTime;

use crate::data_source::SourceError;
use crate::{ChartMeta, OhlcvRecord, QuoteSnapshot, RawSeriesPayload};

/// Decodes a successful chart response body.
///
/// An error object or an empty result list is reported as `NoData`/`Upstream`
/// even when it arrives with a 2xx status.
pub fn decode_chart(body: &str) -> Result<RawSeriesPayload, SourceError> {
    let envelope: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse chart response: {e}")))?;

    if let Some(error) = envelope.chart.error {
        return Err(error.into_source_error(200));
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::no_data("chart response contained no result"))?;

    Ok(result.into_payload())
}

/// Maps a non-2xx chart response to a domain error.
pub fn chart_error(status: u16, body: &str) -> SourceError {
    serde_json::from_str::<YahooChartResponse>(body)
        .ok()
        .and_then(|envelope| envelope.chart.error)
        .map(|error| error.into_source_error(status))
        .unwrap_or_else(|| SourceError::upstream(status, None))
}

/// Converts parallel-array payloads into ordered records.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeriesNormalizer;

impl SeriesNormalizer {
    /// One record per timestamp, in input order.
    ///
    /// Missing values stay `None`; a record with an unknown close is kept so
    /// rows stay aligned with their timestamps.
    pub fn normalize(&self, payload: &RawSeriesPayload) -> Result<Vec<OhlcvRecord>, SourceError> {
        if payload.timestamps.is_empty() {
            return Err(SourceError::no_data("series contains no timestamps"));
        }

        payload
            .timestamps
            .iter()
            .enumerate()
            .map(|(index, &seconds)| {
                let timestamp = OffsetDateTime::from_unix_timestamp(seconds).map_err(|e| {
                    SourceError::internal(format!("invalid timestamp {seconds}: {e}"))
                })?;
                Ok(OhlcvRecord {
                    timestamp,
                    open: value_at(&payload.open, index),
                    high: value_at(&payload.high, index),
                    low: value_at(&payload.low, index),
                    close: value_at(&payload.close, index),
                    volume: value_at(&payload.volume, index),
                })
            })
            .collect()
    }

    /// Derives `change` and the fractional `change_percent` from metadata.
    pub fn quote(&self, meta: ChartMeta) -> QuoteSnapshot {
        let change = match (meta.regular_market_price, meta.previous_close) {
            (Some(price), Some(previous)) => Some(price - previous),
            _ => None,
        };
        let change_percent = match (change, meta.previous_close) {
            (Some(change), Some(previous)) if previous != 0.0 => Some(change / previous),
            _ => None,
        };

        QuoteSnapshot {
            meta,
            change,
            change_percent,
        }
    }
}

fn value_at<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}

// Yahoo Finance chart response structures
#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl YahooChartError {
    fn into_source_error(self, status: u16) -> SourceError {
        let description = self.description.or(self.code.clone());
        match self.code.as_deref() {
            Some("Not Found") => SourceError::no_data(
                description.unwrap_or_else(|| String::from("no data found")),
            ),
            _ => SourceError::upstream(status, description.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    meta: YahooChartMeta,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Option<YahooChartIndicators>,
}

impl YahooChartResult {
    fn into_payload(self) -> RawSeriesPayload {
        let quote = self
            .indicators
            .and_then(|indicators| indicators.quote.into_iter().next())
            .unwrap_or_default();

        RawSeriesPayload {
            meta: self.meta.into_meta(),
            timestamps: self.timestamp.unwrap_or_default(),
            open: quote.open,
            high: quote.high,
            low: quote.low,
            close: quote.close,
            volume: quote.volume.into_iter().map(|v| v.and_then(to_volume)).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooChartMeta {
    symbol: String,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    full_exchange_name: Option<String>,
    #[serde(default)]
    exchange_name: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
    #[serde(default)]
    regular_market_day_high: Option<f64>,
    #[serde(default)]
    regular_market_day_low: Option<f64>,
    #[serde(default)]
    fifty_two_week_high: Option<f64>,
    #[serde(default)]
    fifty_two_week_low: Option<f64>,
    #[serde(default)]
    regular_market_volume: Option<f64>,
    #[serde(default)]
    first_trade_date: Option<i64>,
    #[serde(default)]
    regular_market_time: Option<i64>,
}

impl YahooChartMeta {
    fn into_meta(self) -> ChartMeta {
        ChartMeta {
            symbol: self.symbol,
            name: self.long_name.or(self.short_name),
            exchange: self.full_exchange_name.or(self.exchange_name),
            currency: self.currency,
            regular_market_price: self.regular_market_price,
            previous_close: self.previous_close.or(self.chart_previous_close),
            day_high: self.regular_market_day_high,
            day_low: self.regular_market_day_low,
            fifty_two_week_high: self.fifty_two_week_high,
            fifty_two_week_low: self.fifty_two_week_low,
            volume: self.regular_market_volume.and_then(to_volume),
            first_trade: self.first_trade_date.and_then(to_datetime),
            market_time: self.regular_market_time.and_then(to_datetime),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn to_volume(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}

fn to_datetime(seconds: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(seconds).ok()
}
