//! Composite session schedule.
//!
//! The schedule coarsens a session into a fixed three-phase window pattern:
//! 5-minute windows for the first hour, 15-minute windows mid-session,
//! 5-minute windows for the last hour. Fine resolution where gaps fill or
//! fail, coarse where little happens.

use chrono::{Duration, NaiveDateTime};

/// Aggregation window. Bars are assigned with `(start, end]` semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Build the composite window sequence for a session.
///
/// Phase 1: `open` to `min(open+1h, close)` in 5-minute steps.
/// Phase 2: phase 1 end to `max(close-1h, open)` in 15-minute steps, only
/// if that interval is non-empty.
/// Phase 3: `max(close-1h, open)` to `close` in 5-minute steps.
/// The last step of each phase is clipped to the phase end. Returns an
/// empty sequence when `close <= open`.
///
/// For sessions shorter than two hours the phase ranges can overlap; the
/// resampler's single forward scan over the bars leaves the duplicated
/// windows empty, so no bar is counted twice.
pub fn build_windows(open: NaiveDateTime, close: NaiveDateTime) -> Vec<Window> {
    if close <= open {
        return Vec::new();
    }
    let five = Duration::minutes(5);
    let fifteen = Duration::minutes(15);
    let hour = Duration::hours(1);

    let phase1_end = (open + hour).min(close);
    let last_hour_start = (close - hour).max(open);

    let mut windows = Vec::new();
    push_steps(&mut windows, open, phase1_end, five);
    if last_hour_start > phase1_end {
        push_steps(&mut windows, phase1_end, last_hour_start, fifteen);
    }
    push_steps(&mut windows, last_hour_start.max(open), close, five);
    windows
}

fn push_steps(out: &mut Vec<Window>, from: NaiveDateTime, to: NaiveDateTime, step: Duration) {
    let mut cur = from;
    while cur < to {
        let end = (cur + step).min(to);
        out.push(Window { start: cur, end });
        cur = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    #[test]
    fn full_session_yields_42_windows() {
        let windows = build_windows(at(9, 30), at(16, 0));
        // 12 five-minute + 18 fifteen-minute + 12 five-minute.
        assert_eq!(windows.len(), 42);
        assert_eq!(windows[0].start, at(9, 30));
        assert_eq!(windows[0].end, at(9, 35));
        assert_eq!(windows[11].end, at(10, 30));
        assert_eq!(windows[12].end, at(10, 45));
        assert_eq!(windows[29].end, at(15, 0));
        assert_eq!(windows[30].end, at(15, 5));
        assert_eq!(windows.last().unwrap().end, at(16, 0));
    }

    #[test]
    fn full_session_windows_are_contiguous() {
        let windows = build_windows(at(9, 30), at(16, 0));
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn half_day_yields_30_windows() {
        let windows = build_windows(at(9, 30), at(13, 0));
        // 12 five-minute + 6 fifteen-minute + 12 five-minute.
        assert_eq!(windows.len(), 30);
        assert_eq!(windows[11].end, at(10, 30));
        assert_eq!(windows[17].end, at(12, 0));
        assert_eq!(windows.last().unwrap().end, at(13, 0));
    }

    #[test]
    fn degenerate_session_is_empty() {
        assert!(build_windows(at(9, 30), at(9, 30)).is_empty());
        assert!(build_windows(at(16, 0), at(9, 30)).is_empty());
    }

    #[test]
    fn short_phase_clips_last_window() {
        let windows = build_windows(at(9, 30), at(9, 47));
        // Phase 1 runs to the close; phase 3 clamps to open and duplicates it.
        assert_eq!(windows.len(), 8);
        assert_eq!(windows[3].start, at(9, 45));
        assert_eq!(windows[3].end, at(9, 47));
        assert_eq!(windows[4].start, at(9, 30));
    }

    #[test]
    fn one_hour_session_has_no_middle_phase() {
        let windows = build_windows(at(9, 30), at(10, 30));
        // Phase 1 and phase 3 each cover the full hour.
        assert_eq!(windows.len(), 24);
        assert!(windows.iter().all(|w| w.end - w.start == Duration::minutes(5)));
    }
}
