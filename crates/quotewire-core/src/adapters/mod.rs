mod yahoo;

pub use yahoo::{YahooChartSource, DEFAULT_BASE_URL};
