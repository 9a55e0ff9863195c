//! DailyRow and SummaryRow — the computed metric records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-threshold outcome for one day.
///
/// Carries its own threshold value so a row is self-describing; consumers
/// look stats up by value rather than by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdStats {
    /// Excursion threshold as a decimal fraction (e.g. 0.015 for 1.5%).
    pub threshold: Decimal,
    /// Gap reached at least the threshold magnitude (downward).
    pub qualify: bool,
    /// Qualified and the post-anchor excursion stayed within half the threshold.
    pub hold: bool,
    /// Post-anchor excursion normalized by the threshold, 6-dp rounded.
    pub violation_ratio: Decimal,
}

/// One metrics record per qualifying trading day.
///
/// Produced once by the reducer and read-only thereafter. Price fields are
/// stored unrounded; percentage fields carry the 6-decimal away-from-zero
/// rounding that is part of the output contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    pub date: NaiveDate,

    // ── Prices (unrounded) ──
    pub prev_close: Decimal,
    pub open: Decimal,
    /// Close of the last bar at or before the anchor time-of-day.
    pub anchor_close: Decimal,
    /// Lowest low among bars strictly after the anchor.
    pub low_after: Decimal,
    /// Highest high among bars strictly after the anchor.
    pub high_after: Decimal,
    /// Last bar's close.
    pub close: Decimal,

    // ── Percentages (6-dp rounded) ──
    pub gap_pct: Decimal,
    pub extra_drop_pct: Decimal,
    pub extra_rise_pct: Decimal,

    // ── Timing ──
    /// Minutes from the anchor instant to the post-anchor low, rounded to
    /// the nearest whole minute (away from zero on .5).
    pub time_to_low_mins: i64,

    // ── Per-threshold outcomes, in grid order ──
    pub thresholds: Vec<ThresholdStats>,
}

impl DailyRow {
    /// Look up the stats record for a threshold value.
    pub fn stat_for(&self, threshold: Decimal) -> Option<&ThresholdStats> {
        self.thresholds.iter().find(|s| s.threshold == threshold)
    }
}

/// One cross-day aggregate per (symbol, threshold) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Threshold label from the grid (e.g. "1.5%").
    pub threshold: String,
    /// Number of qualifying days.
    pub n: usize,
    /// Qualifying days that held containment.
    pub hits: usize,
    /// hits / n, 0 when n = 0.
    pub hit_rate: f64,
    /// Wilson score interval lower bound at 95% confidence.
    pub wilson_lower95: f64,
    /// Nearest-rank 99th percentile of qualifying violation ratios.
    pub p99_violation_ratio: Decimal,
    /// Upper median of qualifying time-to-low values, minutes.
    pub median_time_to_low_mins: i64,
}
