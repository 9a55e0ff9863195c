//! GapLab Core — domain types, session-time resampling, daily reduction,
//! cross-day summaries, and data acquisition.
//!
//! This crate contains the heart of the gap-containment pipeline:
//! - Domain types (bars, day sequences, daily metric rows, summary rows)
//! - Session detection and the composite coarsening schedule
//! - The composite resampler with need detection and coverage fallback
//! - The daily reducer (gap, excursion, qualify/hold/violation ratio)
//! - The cross-day summarizer (hit rate, Wilson lower bound, tail percentile)
//! - Providers, backfill, and the on-disk CSV bar store

pub mod analysis;
pub mod data;
pub mod domain;
pub mod session;
pub mod stats;
pub mod thresholds;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the pipeline's value types are Send + Sync.
    ///
    /// The runner fans symbols out across a thread pool; everything it moves
    /// between threads must stay thread-safe. If any type fails this check,
    /// the build breaks immediately.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::DayBars>();
        require_sync::<domain::DayBars>();
        require_send::<domain::DailyRow>();
        require_sync::<domain::DailyRow>();
        require_send::<domain::SummaryRow>();
        require_sync::<domain::SummaryRow>();
        require_send::<domain::ThresholdStats>();
        require_sync::<domain::ThresholdStats>();

        // Threshold grid
        require_send::<thresholds::ThresholdGrid>();
        require_sync::<thresholds::ThresholdGrid>();

        // Session types
        require_send::<session::Session>();
        require_sync::<session::Session>();
        require_send::<session::Window>();
        require_sync::<session::Window>();
        require_send::<session::ResampleMode>();
        require_sync::<session::ResampleMode>();
        require_send::<session::ResampleOutcome>();
        require_sync::<session::ResampleOutcome>();

        // Data layer
        require_send::<data::StooqProvider>();
        require_sync::<data::StooqProvider>();
        require_send::<data::ThetaProvider>();
        require_sync::<data::ThetaProvider>();
        require_send::<data::BarStore>();
        require_sync::<data::BarStore>();
        require_send::<data::SymbolDays>();
        require_sync::<data::SymbolDays>();
        require_send::<data::BackfillSummary>();
        require_sync::<data::BackfillSummary>();
    }

    /// Architecture contract: providers are object-safe and shareable.
    ///
    /// Backfill takes `&dyn PriceProvider`, so the trait must stay usable
    /// behind a reference. If the trait gains a non-object-safe method this
    /// stops compiling.
    #[test]
    fn price_provider_is_object_safe() {
        fn _check_trait_object_builds(
            provider: &dyn data::PriceProvider,
            start: chrono::NaiveDate,
            end: chrono::NaiveDate,
        ) -> Result<Vec<domain::Bar>, data::ProviderError> {
            provider.fetch_intraday("SPY", 5, start, end)
        }
    }
}
