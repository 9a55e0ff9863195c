//! Bar and DayBars — the fundamental intraday market data units.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Intraday OHLCV bar.
///
/// `timestamp` is the bar's *end* time in local exchange time (naive, no
/// timezone conversion). Prices are exact decimals; `volume` is a
/// non-negative share count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl Bar {
    /// Basic OHLCV sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > Decimal::ZERO
            && self.close > Decimal::ZERO
    }
}

/// One trading session: a calendar date, its chronologically ordered bars,
/// and the prior kept day's final close.
///
/// `prev_close` is zero when no prior day is known (first day of a series);
/// the reducer drops such days. Constructed once by the store or by the
/// resampler; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBars {
    pub date: NaiveDate,
    pub bars: Vec<Bar>,
    pub prev_close: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_bar() -> Bar {
        Bar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 31, 0)
                .unwrap(),
            open: dec!(100.0),
            high: dec!(105.0),
            low: dec!(98.0),
            close: dec!(103.0),
            volume: 50_000,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = dec!(97.0); // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_nonpositive_open() {
        let mut bar = sample_bar();
        bar.open = Decimal::ZERO;
        bar.low = Decimal::ZERO;
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar.timestamp, deser.timestamp);
        assert_eq!(bar.close, deser.close);
        assert_eq!(bar.volume, deser.volume);
    }

    #[test]
    fn day_bars_holds_prev_close() {
        let day = DayBars {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            bars: vec![sample_bar()],
            prev_close: dec!(101.5),
        };
        assert_eq!(day.bars.len(), 1);
        assert_eq!(day.prev_close, dec!(101.5));
    }
}
