use quotewire_core::{dispatch, is_error_text, MarketService, ToolCall};

use crate::cli::Command;

/// Exit code for a tool response that starts with `Error:`.
pub const TOOL_ERROR_EXIT: u8 = 3;

/// Text returned by the tool plus the exit code it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub exit_code: u8,
}

impl CommandOutput {
    fn from_text(text: String) -> Self {
        let exit_code = if is_error_text(&text) { TOOL_ERROR_EXIT } else { 0 };
        Self { text, exit_code }
    }
}

pub fn tool_call(command: &Command) -> ToolCall {
    match command {
        Command::Quote(args) => ToolCall::StockQuote {
            symbol: args.symbol.clone(),
        },
        Command::History(args) => ToolCall::HistoricalData {
            symbol: args.symbol.clone(),
            period: args.period.clone(),
            interval: args.interval.clone(),
        },
        Command::Indices => ToolCall::MarketIndices,
        Command::Compare(args) => ToolCall::CompareStocks {
            symbols: args.symbols.clone(),
        },
    }
}

pub async fn run(command: &Command, service: &MarketService) -> CommandOutput {
    CommandOutput::from_text(dispatch(service, tool_call(command)).await)
}
