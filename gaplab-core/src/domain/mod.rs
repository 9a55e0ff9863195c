//! Domain types for GapLab.

pub mod bar;
pub mod row;

pub use bar::{Bar, DayBars};
pub use row::{DailyRow, SummaryRow, ThresholdStats};

/// Symbol type alias
pub type Symbol = String;
