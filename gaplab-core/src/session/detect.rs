//! Session inference from a day's bar sequence.

use chrono::{Duration, NaiveDateTime, NaiveTime};

use crate::domain::DayBars;

/// Inferred session boundaries for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub open: NaiveDateTime,
    pub close: NaiveDateTime,
}

impl Session {
    /// True when the session is shorter than `normal` (holiday half day).
    pub fn is_early_close(&self, normal: Duration) -> bool {
        self.close - self.open < normal
    }
}

/// Best-effort session detection: (first bar, last bar) timestamps.
///
/// An empty day degrades to a zero-length session at midnight. Inverted
/// ordering (corrupt input) is swapped so `open <= close` always holds.
/// No calendar lookup, no error.
pub fn detect(day: &DayBars) -> Session {
    let (Some(first), Some(last)) = (day.bars.first(), day.bars.last()) else {
        let midnight = day.date.and_time(NaiveTime::MIN);
        return Session {
            open: midnight,
            close: midnight,
        };
    };
    if last.timestamp < first.timestamp {
        Session {
            open: last.timestamp,
            close: first.timestamp,
        }
    } else {
        Session {
            open: first.timestamp,
            close: last.timestamp,
        }
    }
}
