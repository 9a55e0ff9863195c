//! GapLab Runner — run configuration, orchestration, and artifact exports.
//!
//! This crate builds on `gaplab-core` to provide:
//! - TOML run configuration with full defaults
//! - Per-symbol pipeline runs, fanned out across a rayon thread pool
//! - CSV/JSON/Markdown artifact generation with a blake3 manifest

pub mod config;
pub mod export;
pub mod runner;

pub use config::{AnalysisConfig, ConfigError, StooqConfig, ThetaConfig};
pub use export::{
    export_daily_csv, export_leaderboard_json, export_summary_json, export_worst_vr_csv,
    generate_report, save_artifacts, RunMeta,
};
pub use runner::{run_all, run_symbol, RunError, RunOptions, SymbolReport};
