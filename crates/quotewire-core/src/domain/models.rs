use time::OffsetDateTime;

/// Instrument metadata returned alongside every chart payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartMeta {
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub regular_market_price: Option<f64>,
    /// Baseline for change calculations.
    pub previous_close: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub volume: Option<u64>,
    pub first_trade: Option<OffsetDateTime>,
    pub market_time: Option<OffsetDateTime>,
}

/// Upstream chart payload: metadata plus parallel per-timestamp arrays.
///
/// Value arrays may be shorter than `timestamps`; a missing slot reads as unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeriesPayload {
    pub meta: ChartMeta,
    /// Unix seconds, ascending and unique.
    pub timestamps: Vec<i64>,
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<Option<u64>>,
}

/// One normalized OHLCV row. `None` means upstream had no value at that index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OhlcvRecord {
    pub timestamp: OffsetDateTime,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

/// Metadata with derived change figures.
///
/// `change_percent` is a fraction (`0.0125` for 1.25%); the formatter scales it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSnapshot {
    pub meta: ChartMeta,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
}
