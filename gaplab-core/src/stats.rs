//! Statistics helpers — pure functions shared by the reducer and summarizer.
//!
//! Every helper is a pure function with a zero-valued result for degenerate
//! input; nothing here errors or panics.

use rust_decimal::{Decimal, RoundingStrategy};

/// z for a 95% one-sided Wilson bound.
const Z95: f64 = 1.96;

/// Lower bound of the Wilson score interval at 95% confidence.
///
/// With p = hits/n and z = 1.96:
/// denom = 1 + z²/n, center = p + z²/(2n),
/// margin = z·sqrt((p(1−p) + z²/(4n))/n), result = (center − margin)/denom.
/// Returns 0.0 when n = 0.
pub fn wilson_lower95(hits: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    let p = hits as f64 / nf;
    let z2 = Z95 * Z95;
    let denom = 1.0 + z2 / nf;
    let center = p + z2 / (2.0 * nf);
    let margin = Z95 * ((p * (1.0 - p) + z2 / (4.0 * nf)) / nf).sqrt();
    // Guard against a tiny negative from float rounding at p = 0.
    ((center - margin) / denom).max(0.0)
}

/// Round to 6 decimal digits, midpoints away from zero.
///
/// This rounding is part of the output contract: every exported percentage
/// field carries exactly this precision.
pub fn round6(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
}

/// Nearest-rank index into an ascending-sorted sample of size `n`:
/// max(0, floor(pct·(n−1))). Returns 0 for empty samples.
pub fn percentile_index(n: usize, pct: f64) -> usize {
    let idx = (pct * (n as f64 - 1.0)).floor();
    if idx <= 0.0 {
        0
    } else {
        idx as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // ─── Wilson lower bound ─────────────────────────────────────────────

    #[test]
    fn wilson_zero_sample_is_zero() {
        assert_eq!(wilson_lower95(0, 0), 0.0);
    }

    #[test]
    fn wilson_all_hits_single_sample() {
        // p = 1, n = 1 collapses to 1/(1 + z²).
        let w = wilson_lower95(1, 1);
        assert!((w - 1.0 / (1.0 + 1.96 * 1.96)).abs() < 1e-12);
    }

    #[test]
    fn wilson_no_hits_is_zero() {
        let w = wilson_lower95(0, 1);
        assert!(w.abs() < 1e-12);
        assert!(w >= 0.0);
    }

    #[test]
    fn wilson_below_hit_rate() {
        for &(hits, n) in &[(1usize, 2usize), (5, 10), (9, 10), (50, 60), (199, 200)] {
            let w = wilson_lower95(hits, n);
            let rate = hits as f64 / n as f64;
            assert!(w <= rate, "wilson {w} above hit rate {rate}");
            assert!((0.0..=1.0).contains(&w));
        }
    }

    #[test]
    fn wilson_tightens_with_sample_size() {
        // Same proportion, more observations: bound moves toward the rate.
        assert!(wilson_lower95(80, 100) < wilson_lower95(800, 1000));
    }

    // ─── round6 ─────────────────────────────────────────────────────────

    #[test]
    fn round6_midpoint_away_from_zero() {
        assert_eq!(round6(dec!(0.0000005)), dec!(0.000001));
        assert_eq!(round6(dec!(-0.0000005)), dec!(-0.000001));
    }

    #[test]
    fn round6_truncates_longer_fractions() {
        assert_eq!(round6(dec!(0.8130081)), dec!(0.813008));
        assert_eq!(round6(dec!(0.0081300813)), dec!(0.008130));
    }

    #[test]
    fn round6_leaves_shorter_fractions_alone() {
        assert_eq!(round6(dec!(-0.02)), dec!(-0.02));
    }

    // ─── Percentile index ───────────────────────────────────────────────

    #[test]
    fn percentile_index_edges() {
        assert_eq!(percentile_index(0, 0.99), 0);
        assert_eq!(percentile_index(1, 0.99), 0);
        assert_eq!(percentile_index(2, 0.99), 0);
    }

    #[test]
    fn percentile_index_nearest_rank() {
        assert_eq!(percentile_index(100, 0.99), 98); // floor(0.99 * 99)
        assert_eq!(percentile_index(101, 0.99), 99);
        assert_eq!(percentile_index(10, 0.5), 4); // floor(0.5 * 9)
    }
}
