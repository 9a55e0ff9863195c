//! Per-symbol pipeline orchestration.
//!
//! Two entry points:
//! - [`run_symbol`] — load one symbol from the store and push it through
//!   resampling, reduction, and summarization;
//! - [`run_all`] — fan a symbol list across a rayon thread pool.

use chrono::{Duration, NaiveTime};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use gaplab_core::analysis::{build_rows, build_summary};
use gaplab_core::data::{BarStore, StoreError};
use gaplab_core::domain::{DailyRow, DayBars, SummaryRow};
use gaplab_core::session::{detect, resample_if_needed, ResampleMode, ResampleOutcome};
use gaplab_core::thresholds::ThresholdGrid;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Settings shared by every symbol in a run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Anchor time-of-day for the daily reduction.
    pub anchor: NaiveTime,
    pub resample: ResampleMode,
}

/// Everything the pipeline produced for one symbol.
///
/// The counters describe the run itself, not the market: how many days came
/// off disk, how many were coarsened or fell back, and what the store
/// discarded as too thin.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub days_loaded: usize,
    pub thin_days_dropped: usize,
    pub days_coarsened: usize,
    pub fallbacks: usize,
    pub early_close_days: usize,
    pub rows: Vec<DailyRow>,
    pub summaries: Vec<SummaryRow>,
}

/// Sessions shorter than this count as early closes.
fn normal_session() -> Duration {
    Duration::hours(6)
}

/// Run the full pipeline for one symbol.
pub fn run_symbol(
    store: &BarStore,
    symbol: &str,
    options: &RunOptions,
    grid: &ThresholdGrid,
) -> Result<SymbolReport, RunError> {
    let loaded = store.load_days(symbol)?;
    let days_loaded = loaded.days.len();

    let mut days_coarsened = 0;
    let mut fallbacks = 0;
    let mut early_close_days = 0;

    let mut days: Vec<DayBars> = Vec::with_capacity(days_loaded);
    for day in loaded.days {
        // Session length is judged on the raw bars, before any coarsening.
        if detect(&day).is_early_close(normal_session()) {
            early_close_days += 1;
        }
        let (day, outcome) = resample_if_needed(day, options.resample);
        match outcome {
            ResampleOutcome::Resampled => days_coarsened += 1,
            ResampleOutcome::FellBack => fallbacks += 1,
            ResampleOutcome::Passthrough => {}
        }
        days.push(day);
    }

    let rows = build_rows(&days, options.anchor, grid);
    let summaries = build_summary(&rows, grid);

    Ok(SymbolReport {
        symbol: symbol.to_string(),
        days_loaded,
        thin_days_dropped: loaded.thin_days_dropped,
        days_coarsened,
        fallbacks,
        early_close_days,
        rows,
        summaries,
    })
}

/// Run every symbol in parallel, preserving input order.
///
/// The first symbol that errors aborts the whole run; partial output would
/// otherwise masquerade as a complete one.
pub fn run_all(
    store: &BarStore,
    symbols: &[String],
    options: &RunOptions,
    grid: &ThresholdGrid,
) -> Result<Vec<SymbolReport>, RunError> {
    symbols
        .par_iter()
        .map(|symbol| run_symbol(store, symbol, options, grid))
        .collect()
}
