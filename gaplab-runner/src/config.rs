//! Analysis run configuration: TOML file with serde defaults.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. CLI flags override file values; that merge happens
//! in the CLI layer, not here.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use gaplab_core::data::{StooqOptions, ThetaOptions};
use gaplab_core::session::ResampleMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {message}")]
    Read { path: String, message: String },

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid anchor '{0}' (expected HH:MM)")]
    InvalidAnchor(String),
}

/// Top-level configuration for an analysis or backfill run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Root of the on-disk bar store.
    pub data_root: String,
    /// Root for written artifacts.
    pub output_root: String,
    /// Symbols to run; empty means discover from the data root.
    pub symbols: Vec<String>,
    /// Anchor time-of-day, `HH:MM`, parsed at use.
    pub anchor: String,
    pub resample: ResampleMode,
    /// Row cap for the worst-violation-ratio exceptions export.
    pub top_worst: usize,
    pub stooq: StooqConfig,
    pub theta: ThetaConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_root: "data".to_string(),
            output_root: "output".to_string(),
            symbols: Vec::new(),
            anchor: "10:00".to_string(),
            resample: ResampleMode::Auto,
            top_worst: 25,
            stooq: StooqConfig::default(),
            theta: ThetaConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a config file; a missing file is an error, an empty one is not.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Parse the configured anchor into a time-of-day.
    pub fn anchor_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.anchor, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&self.anchor, "%H:%M:%S"))
            .map_err(|_| ConfigError::InvalidAnchor(self.anchor.clone()))
    }
}

/// `[stooq]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StooqConfig {
    /// Override for the endpoint URL template.
    pub url_template: Option<String>,
    pub throttle_ms: u64,
    pub retries: u32,
    /// Explicit symbol translations, checked before the `.us` fallback.
    pub symbol_map: BTreeMap<String, String>,
}

impl Default for StooqConfig {
    fn default() -> Self {
        Self {
            url_template: None,
            throttle_ms: 250,
            retries: 3,
            symbol_map: BTreeMap::new(),
        }
    }
}

impl StooqConfig {
    pub fn options(&self) -> StooqOptions {
        let mut options = StooqOptions::default();
        if let Some(template) = &self.url_template {
            options.url_template = template.clone();
        }
        options.symbol_map = self.symbol_map.clone();
        options.throttle = Duration::from_millis(self.throttle_ms);
        options.max_retries = self.retries;
        options
    }
}

/// `[theta]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThetaConfig {
    pub host: String,
    pub port: u16,
    pub throttle_ms: u64,
    pub retries: u32,
}

impl Default for ThetaConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 25503,
            throttle_ms: 250,
            retries: 3,
        }
    }
}

impl ThetaConfig {
    pub fn options(&self) -> ThetaOptions {
        ThetaOptions {
            host: self.host.clone(),
            port: self.port,
            throttle: Duration::from_millis(self.throttle_ms),
            max_retries: self.retries,
        }
    }
}
