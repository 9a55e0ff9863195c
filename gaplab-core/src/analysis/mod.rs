//! The reduction pipeline: days in, per-day rows and per-threshold summaries out.

pub mod reducer;
pub mod summary;

pub use reducer::build_rows;
pub use summary::build_summary;
