//! Historical backfill: provider → store.
//!
//! Fetches intraday bars for a symbol over a date range and lands them in
//! the CSV store, one file per calendar year.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use thiserror::Error;

use super::provider::{PriceProvider, ProviderError};
use super::store::{BarStore, StoreError};
use crate::domain::{Bar, Symbol};

#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("store: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct BackfillOptions {
    pub interval_mins: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Per-symbol backfill result.
#[derive(Debug, Clone)]
pub struct BackfillSummary {
    pub symbol: Symbol,
    pub bars_fetched: usize,
    pub files_written: usize,
}

/// Fetch bars for one symbol and write them into the store.
///
/// A fetch that returns no bars produces an empty summary, not an error.
pub fn run_backfill(
    provider: &dyn PriceProvider,
    store: &BarStore,
    symbol: &str,
    options: &BackfillOptions,
) -> Result<BackfillSummary, BackfillError> {
    let bars = provider.fetch_intraday(symbol, options.interval_mins, options.start, options.end)?;

    let mut by_year: BTreeMap<i32, Vec<Bar>> = BTreeMap::new();
    for bar in &bars {
        by_year.entry(bar.timestamp.year()).or_default().push(bar.clone());
    }

    let files_written = by_year.len();
    for (year, year_bars) in &by_year {
        store.write_year(symbol, *year, year_bars)?;
    }

    Ok(BackfillSummary {
        symbol: symbol.to_string(),
        bars_fetched: bars.len(),
        files_written,
    })
}
