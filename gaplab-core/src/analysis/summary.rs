//! Cross-day summaries: one row per containment threshold.

use rust_decimal::Decimal;

use crate::domain::{DailyRow, SummaryRow};
use crate::stats::{percentile_index, wilson_lower95};
use crate::thresholds::ThresholdGrid;

/// Aggregate all of a symbol's rows into one `SummaryRow` per threshold.
///
/// Each threshold is summarized independently over its qualifying rows.
/// Empty subsets produce zero-valued summaries rather than errors.
pub fn build_summary(rows: &[DailyRow], grid: &ThresholdGrid) -> Vec<SummaryRow> {
    grid.thresholds()
        .iter()
        .map(|t| {
            let qualifying: Vec<&DailyRow> = rows
                .iter()
                .filter(|r| r.stat_for(t.value).map(|s| s.qualify).unwrap_or(false))
                .collect();
            let n = qualifying.len();
            let hits = qualifying
                .iter()
                .filter(|r| r.stat_for(t.value).map(|s| s.hold).unwrap_or(false))
                .count();
            let hit_rate = if n == 0 { 0.0 } else { hits as f64 / n as f64 };

            let p99_violation_ratio = if n == 0 {
                Decimal::ZERO
            } else {
                let mut ratios: Vec<Decimal> = qualifying
                    .iter()
                    .filter_map(|r| r.stat_for(t.value).map(|s| s.violation_ratio))
                    .collect();
                ratios.sort();
                ratios[percentile_index(ratios.len(), 0.99)]
            };

            let median_time_to_low_mins = if n == 0 {
                0
            } else {
                let mut mins: Vec<i64> = qualifying.iter().map(|r| r.time_to_low_mins).collect();
                mins.sort_unstable();
                // Upper median: element n/2 of the sorted values, not an
                // average of the middle pair.
                mins[n / 2]
            };

            SummaryRow {
                threshold: t.label.clone(),
                n,
                hits,
                hit_rate,
                wilson_lower95: wilson_lower95(hits, n),
                p99_violation_ratio,
                median_time_to_low_mins,
            }
        })
        .collect()
}
