//! # Tool Boundary
//!
//! Entry point for tool-calling hosts. A [`ToolCall`] carries primitive
//! arguments exactly as the caller sent them; [`dispatch`] validates them,
//! runs the matching [`MarketService`] operation and flattens the outcome to
//! a single text block. Failures never escape as errors: they come back as
//! text starting with `Error:`.
//!
//! ## Wire shape
//!
//! ```json
//! {"name": "get_historical_data", "arguments": {"symbol": "AAPL", "period": "1mo"}}
//! ```

use serde::Deserialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::data_source::SourceError;
use crate::service::MarketService;
use crate::{Interval, Period, Symbol};

/// Prefix marking a failed tool response.
pub const ERROR_PREFIX: &str = "Error:";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "name", content = "arguments")]
pub enum ToolCall {
    #[serde(rename = "get_stock_quote")]
    StockQuote { symbol: String },
    #[serde(rename = "get_historical_data")]
    HistoricalData {
        symbol: String,
        #[serde(default)]
        period: Option<String>,
        #[serde(default)]
        interval: Option<String>,
    },
    #[serde(rename = "get_market_indices")]
    MarketIndices,
    #[serde(rename = "compare_stocks")]
    CompareStocks { symbols: Vec<String> },
}

impl ToolCall {
    pub const NAMES: [&'static str; 4] = [
        "get_stock_quote",
        "get_historical_data",
        "get_market_indices",
        "compare_stocks",
    ];

    pub fn from_json(raw: &str) -> Result<Self, SourceError> {
        serde_json::from_str(raw)
            .map_err(|e| SourceError::invalid_parameter(format!("invalid tool call: {e}")))
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::StockQuote { .. } => "get_stock_quote",
            Self::HistoricalData { .. } => "get_historical_data",
            Self::MarketIndices => "get_market_indices",
            Self::CompareStocks { .. } => "compare_stocks",
        }
    }
}

/// Runs one tool call and returns its text response.
pub async fn dispatch(service: &MarketService, call: ToolCall) -> String {
    let request_id = Uuid::new_v4();
    let span = info_span!("tool_call", tool = call.name(), %request_id);

    async move {
        info!("tool call started");
        match run(service, call).await {
            Ok(text) => {
                info!("tool call completed");
                text
            }
            Err(error) => {
                warn!(code = error.code(), error = %error, "tool call failed");
                error_text(&error)
            }
        }
    }
    .instrument(span)
    .await
}

/// `Error: <message>` for a failed call.
pub fn error_text(error: &SourceError) -> String {
    format!("{ERROR_PREFIX} {}", error.message())
}

pub fn is_error_text(text: &str) -> bool {
    text.starts_with(ERROR_PREFIX)
}

async fn run(service: &MarketService, call: ToolCall) -> Result<String, SourceError> {
    let formatter = service.formatter();

    match call {
        ToolCall::StockQuote { symbol } => {
            let symbol = Symbol::parse(&symbol)?;
            let quote = service.quote(&symbol).await?;
            Ok(formatter.render_quote(&quote))
        }
        ToolCall::HistoricalData {
            symbol,
            period,
            interval,
        } => {
            let symbol = Symbol::parse(&symbol)?;
            let period = period
                .as_deref()
                .map(str::parse::<Period>)
                .transpose()?
                .unwrap_or_default();
            let interval = interval
                .as_deref()
                .map(str::parse::<Interval>)
                .transpose()?
                .unwrap_or_default();

            let records = service.history(&symbol, period, interval).await?;
            Ok(formatter.render_series(&records, &symbol, period, interval))
        }
        ToolCall::MarketIndices => {
            let rows = service.market_indices().await?;
            Ok(formatter.render_indices(&rows))
        }
        ToolCall::CompareStocks { symbols } => {
            let symbols = symbols
                .iter()
                .map(|raw| Symbol::parse(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let quotes = service.compare(&symbols).await?;
            Ok(formatter.render_comparison(&quotes))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_calls_by_name() {
        let call = ToolCall::from_json(
            &json!({"name": "get_historical_data", "arguments": {"symbol": "AAPL", "period": "3mo"}})
                .to_string(),
        )
        .expect("valid call");

        assert_eq!(
            call,
            ToolCall::HistoricalData {
                symbol: String::from("AAPL"),
                period: Some(String::from("3mo")),
                interval: None,
            }
        );
        assert_eq!(call.name(), "get_historical_data");

        let indices = ToolCall::from_json(r#"{"name":"get_market_indices"}"#).expect("unit call");
        assert_eq!(indices, ToolCall::MarketIndices);
    }

    #[test]
    fn unknown_tool_is_an_invalid_parameter() {
        let error = ToolCall::from_json(r#"{"name":"get_news","arguments":{}}"#).expect_err("unknown");
        assert_eq!(error.code(), "source.invalid_parameter");
    }

    #[test]
    fn error_text_is_prefixed() {
        let text = error_text(&SourceError::no_data("No data found for ZZZZ"));
        assert_eq!(text, "Error: No data found for ZZZZ");
        assert!(is_error_text(&text));
        assert!(!is_error_text("Symbol: AAPL"));
    }
}
