//! # Domain Models
//!
//! Canonical types shared by the fetcher, normalizer and formatter.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker (`AAPL`, `^GSPC`, `EURUSD=X`) |
//! | [`Period`] | Relative lookback window (`1d` … `max`) |
//! | [`Interval`] | Chart sampling interval (`1m` … `3mo`) |
//! | [`RawSeriesPayload`] | Decoded upstream chart payload |
//! | [`OhlcvRecord`] | One normalized row with explicit unknowns |
//! | [`QuoteSnapshot`] | Metadata plus derived change figures |

mod interval;
mod models;
mod period;
mod symbol;

pub use interval::Interval;
pub use models::{ChartMeta, OhlcvRecord, QuoteSnapshot, RawSeriesPayload};
pub use period::{Period, DAY_MS};
pub use symbol::Symbol;
