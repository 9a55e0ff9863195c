//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over intraday history sources (Stooq's
//! public CSV endpoint, a Theta-style local terminal) so backfill can swap
//! implementations and tests can mock the network away.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::Bar;

/// Structured error types for provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("http status {status} fetching {symbol}")]
    HttpStatus { status: u16, symbol: String },

    #[error("response format: {0}")]
    ResponseFormat(String),

    #[error("provider error: {0}")]
    Other(String),
}

/// Trait for intraday history providers.
///
/// Implementations own their HTTP client, throttling, and retry policy;
/// callers see only the final bar list. Bars come back chronologically
/// sorted with timestamps marking each bar's end.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch intraday bars for a symbol, limited to sessions whose date
    /// falls in `[start, end]`.
    fn fetch_intraday(
        &self,
        symbol: &str,
        interval_mins: u32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, ProviderError>;
}
