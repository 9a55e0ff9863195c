//! Composite resampling of minute-granularity days.
//!
//! High-frequency bars are coarsened into the composite schedule; coarse
//! input passes through untouched. Resampling never fails: when coverage
//! is too thin to trust, the original day is returned instead.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{Bar, DayBars};
use crate::session::detect::detect;
use crate::session::schedule::build_windows;

/// Minimum bar count for granularity detection to say anything.
const MIN_BARS_FOR_DETECTION: usize = 5;

/// Aggregated bar count below which resampling is considered unreliable
/// (together with half the window count, whichever is larger).
const MIN_COMPOSITE_BARS: usize = 24;

/// How a day's bars are treated before reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleMode {
    /// Pass every day through unchanged.
    None,
    /// Resample every day onto the composite schedule.
    Composite,
    /// Resample only days detected as minute-granularity.
    #[default]
    Auto,
}

impl fmt::Display for ResampleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResampleMode::None => "none",
            ResampleMode::Composite => "composite",
            ResampleMode::Auto => "auto",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resample mode '{0}' (expected none, composite, or auto)")]
pub struct ParseResampleModeError(String);

impl FromStr for ResampleMode {
    type Err = ParseResampleModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(ResampleMode::None),
            "composite" => Ok(ResampleMode::Composite),
            "auto" => Ok(ResampleMode::Auto),
            _ => Err(ParseResampleModeError(s.to_string())),
        }
    }
}

/// What actually happened to a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleOutcome {
    /// Returned unchanged (mode `none`, coarse input, or nothing to do).
    Passthrough,
    /// Aggregated onto the composite schedule.
    Resampled,
    /// Aggregation coverage was too thin; original bars returned.
    FellBack,
}

/// Apply the configured mode to one day.
pub fn resample_if_needed(day: DayBars, mode: ResampleMode) -> (DayBars, ResampleOutcome) {
    match mode {
        ResampleMode::None => (day, ResampleOutcome::Passthrough),
        ResampleMode::Composite => resample(day),
        ResampleMode::Auto => {
            if needs_resample(&day) {
                resample(day)
            } else {
                (day, ResampleOutcome::Passthrough)
            }
        }
    }
}

/// Granularity detection: median gap between consecutive bar timestamps
/// at or below 65 seconds means minute data. Fewer than five bars is never
/// worth coarsening.
pub fn needs_resample(day: &DayBars) -> bool {
    if day.bars.len() < MIN_BARS_FOR_DETECTION {
        return false;
    }
    let mut gaps: Vec<Duration> = day
        .bars
        .windows(2)
        .map(|pair| pair[1].timestamp - pair[0].timestamp)
        .collect();
    gaps.sort();
    gaps[gaps.len() / 2] <= Duration::seconds(65)
}

/// Aggregate a day onto the composite schedule.
///
/// Each window takes `(start, end]` of the bar timeline: a bar exactly at
/// the window start belongs to the previous window. Aggregated bars carry
/// the window end as their timestamp; empty windows emit nothing. If fewer
/// than `max(24, windows/2)` bars come out, the original day is returned.
pub fn resample(day: DayBars) -> (DayBars, ResampleOutcome) {
    if day.bars.is_empty() {
        return (day, ResampleOutcome::Passthrough);
    }
    let session = detect(&day);
    let windows = build_windows(session.open, session.close);
    if windows.is_empty() {
        return (day, ResampleOutcome::Passthrough);
    }

    let mut out: Vec<Bar> = Vec::with_capacity(windows.len());
    let mut idx = 0;
    for window in &windows {
        let mut agg: Option<Bar> = None;
        while idx < day.bars.len() && day.bars[idx].timestamp <= window.end {
            let bar = &day.bars[idx];
            idx += 1;
            if bar.timestamp <= window.start {
                continue;
            }
            agg = Some(match agg {
                None => Bar {
                    timestamp: window.end,
                    ..bar.clone()
                },
                Some(acc) => Bar {
                    timestamp: window.end,
                    open: acc.open,
                    high: acc.high.max(bar.high),
                    low: acc.low.min(bar.low),
                    close: bar.close,
                    volume: acc.volume + bar.volume,
                },
            });
        }
        if let Some(bar) = agg {
            out.push(bar);
        }
    }

    if out.len() < MIN_COMPOSITE_BARS.max(windows.len() / 2) {
        return (day, ResampleOutcome::FellBack);
    }
    let resampled = DayBars {
        date: day.date,
        bars: out,
        prev_close: day.prev_close,
    };
    (resampled, ResampleOutcome::Resampled)
}
