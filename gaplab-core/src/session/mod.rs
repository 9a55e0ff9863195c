//! Session detection, the composite window schedule, and resampling.

pub mod detect;
pub mod resample;
pub mod schedule;

pub use detect::{detect, Session};
pub use resample::{
    needs_resample, resample, resample_if_needed, ParseResampleModeError, ResampleMode,
    ResampleOutcome,
};
pub use schedule::{build_windows, Window};
