//! Deterministic text reports for quotes and price series.
//!
//! Series tables are sampled with a floor-based stride so long histories stay
//! readable: `step = max(1, N / 10)`, rows at `0, step, 2·step, …`. That yields
//! anywhere from 1 to about 20 rows, not exactly ten. The change line always uses
//! the first and last record of the full series.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::{Interval, OhlcvRecord, Period, QuoteSnapshot, Symbol};

/// Rows the sampler aims for.
pub const SAMPLE_TARGET: usize = 10;
/// Token for values upstream did not provide.
pub const UNKNOWN: &str = "N/A";

const DAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const INTRADAY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month]-[day] [hour]:[minute]");
const STAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");

/// Stride between printed rows for a series of `len` records.
pub fn sample_step(len: usize) -> usize {
    (len / SAMPLE_TARGET).max(1)
}

/// Indices of the rows that get printed.
pub fn sample_indices(len: usize) -> impl Iterator<Item = usize> {
    (0..len).step_by(sample_step(len))
}

/// Close-to-close change between two records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceChange {
    pub absolute: f64,
    /// Fraction of the starting close, unscaled.
    pub fraction: f64,
}

impl PriceChange {
    pub fn between(first: &OhlcvRecord, last: &OhlcvRecord) -> Option<Self> {
        let start = first.close?;
        let end = last.close?;
        if start == 0.0 {
            return None;
        }
        let absolute = end - start;
        Some(Self {
            absolute,
            fraction: absolute / start,
        })
    }
}

/// Printed subset of a series plus summary fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledReport<'a> {
    pub rows: Vec<&'a OhlcvRecord>,
    pub total: usize,
    pub period_start: OffsetDateTime,
    pub period_end: OffsetDateTime,
    pub change: Option<PriceChange>,
}

impl<'a> SampledReport<'a> {
    /// `None` for an empty series.
    pub fn from_records(records: &'a [OhlcvRecord]) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;
        Some(Self {
            rows: sample_indices(records.len()).map(|index| &records[index]).collect(),
            total: records.len(),
            period_start: first.timestamp,
            period_end: last.timestamp,
            change: PriceChange::between(first, last),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReportFormatter;

impl ReportFormatter {
    pub fn render_series(
        &self,
        records: &[OhlcvRecord],
        symbol: &Symbol,
        period: Period,
        interval: Interval,
    ) -> String {
        let Some(report) = SampledReport::from_records(records) else {
            return format!("No data found for {symbol} (period: {period}, interval: {interval})");
        };

        let header = format!(
            "{:<11} {:>9} {:>9} {:>9} {:>9} {:>15}",
            "Date", "Open", "High", "Low", "Close", "Volume"
        );
        let rule = "-".repeat(header.len());
        let mut lines = vec![
            format!("Historical data for {symbol} (period: {period}, interval: {interval})"),
            format!(
                "Trading period: {} to {}",
                format_date(report.period_start, Interval::OneDay),
                format_date(report.period_end, Interval::OneDay)
            ),
            format!("Data points: {} (showing {})", report.total, report.rows.len()),
            String::new(),
            header,
            rule,
        ];

        lines.extend(report.rows.iter().map(|record| {
            format!(
                "{:<11.11} {} {} {} {} {:>15}",
                format_date(record.timestamp, interval),
                price_cell(record.open),
                price_cell(record.high),
                price_cell(record.low),
                price_cell(record.close),
                record.volume.map_or_else(|| UNKNOWN.to_owned(), group_thousands),
            )
        }));

        if let Some(change) = report.change {
            lines.push(String::new());
            lines.push(change_line(change));
        }

        lines.join("\n")
    }

    /// Key/value block; fields upstream did not send are left out.
    pub fn render_quote(&self, quote: &QuoteSnapshot) -> String {
        let meta = &quote.meta;
        let mut lines = vec![format!("Symbol: {}", meta.symbol)];

        push_field(&mut lines, "Name", meta.name.clone());
        push_field(&mut lines, "Exchange", meta.exchange.clone());
        push_field(&mut lines, "Price", meta.regular_market_price.map(money));
        if let (Some(change), Some(fraction)) = (quote.change, quote.change_percent) {
            lines.push(format!("Change: {} ({:.2}%)", money(change), fraction * 100.0));
        }
        push_field(&mut lines, "Previous Close", meta.previous_close.map(money));
        push_field(&mut lines, "Day High", meta.day_high.map(money));
        push_field(&mut lines, "Day Low", meta.day_low.map(money));
        push_field(&mut lines, "52-Week High", meta.fifty_two_week_high.map(money));
        push_field(&mut lines, "52-Week Low", meta.fifty_two_week_low.map(money));
        push_field(&mut lines, "Volume", meta.volume.map(group_thousands));
        push_field(&mut lines, "Currency", meta.currency.clone());
        push_field(
            &mut lines,
            "First Trade",
            meta.first_trade.map(|ts| format_date(ts, Interval::OneDay)),
        );
        push_field(&mut lines, "Last Updated", meta.market_time.map(format_stamp));

        lines.join("\n")
    }

    /// One row per index: name, symbol, price, change, change %.
    pub fn render_indices(&self, rows: &[(&str, QuoteSnapshot)]) -> String {
        let header = format!(
            "{:<22} {:<8} {:>12} {:>10} {:>9}",
            "Index", "Symbol", "Price", "Change", "Change %"
        );
        let rule = "-".repeat(header.len());
        let mut lines = vec![String::from("Market Indices"), String::new(), header, rule];

        for (name, quote) in rows {
            let price = quote
                .meta
                .regular_market_price
                .map_or_else(|| UNKNOWN.to_owned(), |v| format!("{v:.2}"));
            let change = quote
                .change
                .map_or_else(|| UNKNOWN.to_owned(), |v| format!("{v:.2}"));
            let percent = quote
                .change_percent
                .map_or_else(|| UNKNOWN.to_owned(), |v| format!("{:.2}%", v * 100.0));
            lines.push(format!(
                "{:<22} {:<8} {:>12} {:>10} {:>9}",
                name, quote.meta.symbol, price, change, percent
            ));
        }

        lines.join("\n")
    }

    pub fn render_comparison(&self, quotes: &[QuoteSnapshot]) -> String {
        let blocks = quotes
            .iter()
            .map(|quote| self.render_quote(quote))
            .collect::<Vec<_>>();
        format!("Stock Comparison ({} symbols)\n\n{}", quotes.len(), blocks.join("\n\n"))
    }
}

fn change_line(change: PriceChange) -> String {
    format!(
        "Price Change: {} ({:.2}%)",
        money(change.absolute),
        change.fraction * 100.0
    )
}

fn push_field(lines: &mut Vec<String>, label: &str, value: Option<String>) {
    if let Some(value) = value {
        lines.push(format!("{label}: {value}"));
    }
}

fn money(value: f64) -> String {
    format!("${value:.2}")
}

fn price_cell(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("${value:>8.2}"),
        None => format!("{UNKNOWN:>9}"),
    }
}

/// `1234567` → `1,234,567`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn format_date(timestamp: OffsetDateTime, interval: Interval) -> String {
    let format = if interval.is_intraday() {
        INTRADAY_FORMAT
    } else {
        DAY_FORMAT
    };
    timestamp
        .format(format)
        .unwrap_or_else(|_| timestamp.unix_timestamp().to_string())
}

fn format_stamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(STAMP_FORMAT)
        .unwrap_or_else(|_| timestamp.unix_timestamp().to_string())
}
