//! Daily reduction: one metrics row per day that survives the gates.

use chrono::NaiveTime;
use rust_decimal::Decimal;

use crate::domain::{DailyRow, DayBars, ThresholdStats};
use crate::stats::round6;
use crate::thresholds::ThresholdGrid;

/// Reduce a sequence of days to one `DailyRow` each.
///
/// A day is silently dropped (no row, no error) unless all three gates
/// pass, in order:
/// 1. `prev_close > 0` — the first day of a series has no known prior close;
/// 2. an anchor bar exists — the last bar with time-of-day at or before
///    `anchor`;
/// 3. at least one bar lies strictly after the anchor time-of-day.
///
/// Days are expected to arrive chronologically sorted and already resampled
/// as configured; rows come out in input order.
pub fn build_rows(days: &[DayBars], anchor: NaiveTime, grid: &ThresholdGrid) -> Vec<DailyRow> {
    let mut rows = Vec::new();
    for day in days {
        if day.prev_close <= Decimal::ZERO {
            continue;
        }
        let Some(first) = day.bars.first() else {
            continue;
        };
        let Some(anchor_bar) = day
            .bars
            .iter()
            .filter(|b| b.timestamp.time() <= anchor)
            .next_back()
        else {
            continue;
        };
        let after: Vec<_> = day
            .bars
            .iter()
            .filter(|b| b.timestamp.time() > anchor)
            .collect();
        if after.is_empty() {
            continue;
        }

        let open = first.open;
        let gap = open / day.prev_close - Decimal::ONE;
        let anchor_close = anchor_bar.close;

        let low_after = after.iter().map(|b| b.low).min().unwrap_or(Decimal::ZERO);
        let high_after = after.iter().map(|b| b.high).max().unwrap_or(Decimal::ZERO);
        let close = after.last().map(|b| b.close).unwrap_or(Decimal::ZERO);

        let extra_drop = if anchor_close == Decimal::ZERO {
            Decimal::ZERO
        } else {
            (anchor_close - low_after) / anchor_close
        };
        let extra_rise = if anchor_close == Decimal::ZERO {
            Decimal::ZERO
        } else {
            (high_after - anchor_close) / anchor_close
        };

        // Lowest low wins; ties go to the earliest bar. The two-key order
        // keeps the selection deterministic regardless of input quirks.
        let low_bar = after
            .iter()
            .min_by_key(|b| (b.low, b.timestamp))
            .unwrap_or(&after[0]);
        let anchor_instant = day.date.and_time(anchor);
        let secs = (low_bar.timestamp - anchor_instant).num_seconds();
        let time_to_low_mins = (secs as f64 / 60.0).round() as i64;

        let thresholds = grid
            .thresholds()
            .iter()
            .map(|t| threshold_stats(gap, extra_drop, t.value))
            .collect();

        rows.push(DailyRow {
            date: day.date,
            prev_close: day.prev_close,
            open,
            anchor_close,
            low_after,
            high_after,
            close,
            gap_pct: round6(gap),
            extra_drop_pct: round6(extra_drop),
            extra_rise_pct: round6(extra_rise),
            time_to_low_mins,
            thresholds,
        });
    }
    rows
}

/// Per-threshold verdicts from the unrounded gap and excursion.
fn threshold_stats(gap: Decimal, extra_drop: Decimal, threshold: Decimal) -> ThresholdStats {
    let qualify = gap <= -threshold;
    let hold = qualify && extra_drop <= threshold / Decimal::TWO;
    let violation_ratio = if threshold == Decimal::ZERO {
        Decimal::ZERO
    } else {
        extra_drop / threshold
    };
    ThresholdStats {
        threshold,
        qualify,
        hold,
        violation_ratio: round6(violation_ratio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
    }

    fn bar(hour: u32, min: u32, o: Decimal, h: Decimal, l: Decimal, c: Decimal) -> Bar {
        Bar {
            timestamp: date().and_hms_opt(hour, min, 0).unwrap(),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: 1_000,
        }
    }

    /// The worked six-bar day: gap -2%, anchor close 98.4, post-anchor low
    /// 97.6 hit 22 minutes after the anchor.
    fn gap_down_day() -> DayBars {
        DayBars {
            date: date(),
            bars: vec![
                bar(9, 30, dec!(98), dec!(98.2), dec!(97.8), dec!(98)),
                bar(9, 43, dec!(98.0), dec!(98.5), dec!(97.9), dec!(98.3)),
                bar(9, 56, dec!(98.3), dec!(98.6), dec!(98.1), dec!(98.4)),
                bar(10, 9, dec!(98.4), dec!(98.7), dec!(98.0), dec!(98.1)),
                bar(10, 22, dec!(98.1), dec!(98.2), dec!(97.6), dec!(97.7)),
                bar(15, 57, dec!(97.7), dec!(98.1), dec!(97.6), dec!(98.0)),
            ],
            prev_close: dec!(100),
        }
    }

    fn anchor() -> NaiveTime {
        NaiveTime::from_hms_opt(10, 0, 0).unwrap()
    }

    // ─── Worked example ─────────────────────────────────────────────────

    #[test]
    fn reduces_gap_down_day() {
        let rows = build_rows(&[gap_down_day()], anchor(), &ThresholdGrid::standard());
        assert_eq!(rows.len(), 1);
        let row = &rows[0];

        assert_eq!(row.gap_pct, dec!(-0.02));
        assert_eq!(row.anchor_close, dec!(98.4)); // bar ending 09:56
        assert_eq!(row.low_after, dec!(97.6));
        assert_eq!(row.high_after, dec!(98.7));
        assert_eq!(row.close, dec!(98.0));
        assert_eq!(row.extra_drop_pct, dec!(0.008130)); // 0.8 / 98.4, 6 dp
        assert_eq!(row.extra_rise_pct, dec!(0.003049)); // 0.3 / 98.4, 6 dp
    }

    #[test]
    fn time_to_low_takes_earliest_tied_bar() {
        // Lows of 97.6 at 10:22 and 15:57; the earlier bar wins.
        let rows = build_rows(&[gap_down_day()], anchor(), &ThresholdGrid::standard());
        assert_eq!(rows[0].time_to_low_mins, 22);
    }

    #[test]
    fn threshold_verdicts_across_grid() {
        let rows = build_rows(&[gap_down_day()], anchor(), &ThresholdGrid::standard());
        let row = &rows[0];

        // -2% gap qualifies at 1.0%, 1.5%, and exactly at 2.0%.
        let t10 = row.stat_for(dec!(0.01)).unwrap();
        assert!(t10.qualify);
        assert!(!t10.hold); // 0.00813 > 0.005
        assert_eq!(t10.violation_ratio, dec!(0.813008));

        let t15 = row.stat_for(dec!(0.015)).unwrap();
        assert!(t15.qualify);
        assert!(!t15.hold); // 0.00813 > 0.0075
        assert_eq!(t15.violation_ratio, dec!(0.542005));

        let t20 = row.stat_for(dec!(0.02)).unwrap();
        assert!(t20.qualify); // boundary: gap == -threshold
        assert!(t20.hold); // 0.00813 <= 0.01
        assert_eq!(t20.violation_ratio, dec!(0.406504));

        let t30 = row.stat_for(dec!(0.03)).unwrap();
        assert!(!t30.qualify);
        assert!(!t30.hold);
        assert_eq!(t30.violation_ratio, dec!(0.271003)); // ratio is kept even when not qualifying

        let t40 = row.stat_for(dec!(0.04)).unwrap();
        assert!(!t40.qualify);
        assert_eq!(t40.violation_ratio, dec!(0.203252));
    }

    // ─── Gates ──────────────────────────────────────────────────────────

    #[test]
    fn first_day_without_prev_close_is_dropped() {
        let mut day = gap_down_day();
        day.prev_close = Decimal::ZERO;
        assert!(build_rows(&[day], anchor(), &ThresholdGrid::standard()).is_empty());
    }

    #[test]
    fn day_without_anchor_bar_is_dropped() {
        let mut day = gap_down_day();
        day.bars.retain(|b| b.timestamp.time() > anchor());
        assert!(build_rows(&[day], anchor(), &ThresholdGrid::standard()).is_empty());
    }

    #[test]
    fn day_without_post_anchor_bars_is_dropped() {
        let mut day = gap_down_day();
        day.bars.retain(|b| b.timestamp.time() <= anchor());
        assert!(build_rows(&[day], anchor(), &ThresholdGrid::standard()).is_empty());
    }

    #[test]
    fn empty_day_is_dropped() {
        let day = DayBars {
            date: date(),
            bars: vec![],
            prev_close: dec!(100),
        };
        assert!(build_rows(&[day], anchor(), &ThresholdGrid::standard()).is_empty());
    }

    #[test]
    fn mixed_days_keep_input_order() {
        let mut no_prev = gap_down_day();
        no_prev.prev_close = Decimal::ZERO;
        let mut later = gap_down_day();
        later.date = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        for b in &mut later.bars {
            b.timestamp = later.date.and_time(b.timestamp.time());
        }

        let rows = build_rows(
            &[no_prev, gap_down_day(), later],
            anchor(),
            &ThresholdGrid::standard(),
        );
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()
            ]
        );
    }

    // ─── Upward gap ─────────────────────────────────────────────────────

    #[test]
    fn gap_up_day_never_qualifies() {
        let mut day = gap_down_day();
        day.prev_close = dec!(96); // open 98 over prev close 96: +2.08%
        let rows = build_rows(&[day], anchor(), &ThresholdGrid::standard());
        assert_eq!(rows.len(), 1);
        assert!(rows[0].thresholds.iter().all(|t| !t.qualify && !t.hold));
    }

    #[test]
    fn anchor_bar_exactly_at_anchor_counts() {
        let mut day = gap_down_day();
        day.bars[2].timestamp = date().and_hms_opt(10, 0, 0).unwrap();
        let rows = build_rows(&[day], anchor(), &ThresholdGrid::standard());
        // 10:00 bar is at the anchor, so it is the anchor bar, not "after".
        assert_eq!(rows[0].anchor_close, dec!(98.4));
        assert_eq!(rows[0].time_to_low_mins, 22);
    }
}
