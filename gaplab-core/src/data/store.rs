//! On-disk bar store: per-symbol directories of per-year CSV files.
//!
//! Layout: `{data_root}/{SYMBOL}/{SYMBOL}_{YEAR}.csv`
//!
//! File format: header `Date,Time,Open,High,Low,Close,Volume`, dates
//! `%Y-%m-%d`, times `%H:%M`. Loading groups bars by calendar date, drops
//! days with fewer than [`MIN_DAY_BARS`] bars (counted, not an error), and
//! chains each kept day's `PrevClose` from the prior kept day's final close
//! (zero for the first kept day).

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{Bar, DayBars};

/// Days with fewer bars than this are dropped on load.
pub const MIN_DAY_BARS: usize = 20;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no data for symbol {symbol}")]
    NoData { symbol: String },

    #[error("store i/o: {0}")]
    Io(String),

    #[error("malformed row in {path}: {message}")]
    MalformedRow { path: String, message: String },
}

/// Result of loading one symbol from the store.
#[derive(Debug, Clone)]
pub struct SymbolDays {
    pub days: Vec<DayBars>,
    pub files_read: usize,
    pub thin_days_dropped: usize,
}

/// The CSV bar store.
pub struct BarStore {
    data_root: PathBuf,
}

impl BarStore {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    /// Root directory of the store.
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Directory for a specific symbol: `{data_root}/{SYMBOL}/`
    fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.data_root.join(symbol)
    }

    /// Path to the CSV file for a symbol+year: `{data_root}/{SYMBOL}/{SYMBOL}_{YEAR}.csv`
    fn year_path(&self, symbol: &str, year: i32) -> PathBuf {
        self.symbol_dir(symbol).join(format!("{symbol}_{year}.csv"))
    }

    /// Symbols present in the store (subdirectory names), ascending.
    ///
    /// A missing data root is treated as an empty store.
    pub fn discover_symbols(&self) -> Result<Vec<String>, StoreError> {
        if !self.data_root.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.data_root).map_err(|e| {
            StoreError::Io(format!("read dir {}: {e}", self.data_root.display()))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io(format!("dir entry: {e}")))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                symbols.push(name.to_string());
            }
        }
        symbols.sort_unstable();
        Ok(symbols)
    }

    /// Load every stored day for a symbol, oldest first.
    pub fn load_days(&self, symbol: &str) -> Result<SymbolDays, StoreError> {
        let dir = self.symbol_dir(symbol);
        if !dir.exists() {
            return Err(StoreError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let entries = fs::read_dir(&dir)
            .map_err(|e| StoreError::Io(format!("read dir {}: {e}", dir.display())))?;
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io(format!("dir entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                paths.push(path);
            }
        }
        // File-name order is year order; keeps loads deterministic.
        paths.sort();

        let mut by_date: BTreeMap<NaiveDate, Vec<Bar>> = BTreeMap::new();
        let mut files_read = 0;
        for path in &paths {
            read_bar_file(path, &mut by_date)?;
            files_read += 1;
        }

        let mut days = Vec::new();
        let mut thin_days_dropped = 0;
        let mut prev_close = Decimal::ZERO;
        for (date, mut bars) in by_date {
            bars.sort_by_key(|b| b.timestamp);
            if bars.len() < MIN_DAY_BARS {
                thin_days_dropped += 1;
                continue;
            }
            let day_close = bars.last().map(|b| b.close).unwrap_or(Decimal::ZERO);
            days.push(DayBars {
                date,
                bars,
                prev_close,
            });
            prev_close = day_close;
        }

        Ok(SymbolDays {
            days,
            files_read,
            thin_days_dropped,
        })
    }

    /// Write one year's bars for a symbol, in the order given.
    ///
    /// Writes are atomic: write to .tmp, rename into place. Returns the
    /// final file path.
    pub fn write_year(&self, symbol: &str, year: i32, bars: &[Bar]) -> Result<PathBuf, StoreError> {
        let dir = self.symbol_dir(symbol);
        fs::create_dir_all(&dir)
            .map_err(|e| StoreError::Io(format!("create dir {}: {e}", dir.display())))?;

        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(["Date", "Time", "Open", "High", "Low", "Close", "Volume"])
            .map_err(|e| StoreError::Io(format!("csv header: {e}")))?;
        for bar in bars {
            wtr.write_record([
                bar.timestamp.format("%Y-%m-%d").to_string(),
                bar.timestamp.format("%H:%M").to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
            ])
            .map_err(|e| StoreError::Io(format!("csv row: {e}")))?;
        }
        let data = wtr
            .into_inner()
            .map_err(|e| StoreError::Io(format!("csv flush: {e}")))?;

        let path = self.year_path(symbol, year);
        let tmp_path = path.with_extension("csv.tmp");
        fs::write(&tmp_path, data)
            .map_err(|e| StoreError::Io(format!("write {}: {e}", tmp_path.display())))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Io(format!("atomic rename failed: {e}"))
        })?;

        Ok(path)
    }
}

fn read_bar_file(path: &Path, by_date: &mut BTreeMap<NaiveDate, Vec<Bar>>) -> Result<(), StoreError> {
    let file = fs::File::open(path)
        .map_err(|e| StoreError::Io(format!("open {}: {e}", path.display())))?;
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

    for record in rdr.records() {
        let record = record.map_err(|e| StoreError::MalformedRow {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let bar = parse_record(&record).map_err(|message| StoreError::MalformedRow {
            path: path.display().to_string(),
            message,
        })?;
        by_date.entry(bar.timestamp.date()).or_default().push(bar);
    }
    Ok(())
}

fn parse_record(record: &csv::StringRecord) -> Result<Bar, String> {
    if record.len() < 7 {
        return Err(format!("expected 7 fields, got {}", record.len()));
    }
    let date = NaiveDate::parse_from_str(&record[0], "%Y-%m-%d")
        .map_err(|e| format!("date '{}': {e}", &record[0]))?;
    let time = NaiveTime::parse_from_str(&record[1], "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&record[1], "%H:%M:%S"))
        .map_err(|e| format!("time '{}': {e}", &record[1]))?;
    let open = parse_price(&record[2])?;
    let high = parse_price(&record[3])?;
    let low = parse_price(&record[4])?;
    let close = parse_price(&record[5])?;
    let volume = record[6]
        .parse::<u64>()
        .map_err(|e| format!("volume '{}': {e}", &record[6]))?;

    Ok(Bar {
        timestamp: date.and_time(time),
        open,
        high,
        low,
        close,
        volume,
    })
}

fn parse_price(field: &str) -> Result<Decimal, String> {
    field
        .parse::<Decimal>()
        .map_err(|e| format!("price '{field}': {e}"))
}
