//! GapLab CLI — backfill and analysis commands.
//!
//! Commands:
//! - `analyze` — run gap containment analytics over the bar store and write artifacts
//! - `backfill stooq` — fetch intraday bars from the Stooq endpoint into the store
//! - `backfill theta` — fetch intraday bars from a local Theta terminal into the store

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use gaplab_core::data::{
    run_backfill, BackfillOptions, BarStore, PriceProvider, StooqProvider, ThetaProvider,
};
use gaplab_core::thresholds::ThresholdGrid;
use gaplab_runner::{run_all, save_artifacts, AnalysisConfig, RunMeta, RunOptions};

#[derive(Parser)]
#[command(name = "gaplab", about = "GapLab CLI — opening gap containment analytics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis pipeline and write the artifact set.
    Analyze {
        /// Symbols to analyze. Defaults to every symbol in the data root.
        symbols: Vec<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bar store root. Overrides the config file.
        #[arg(long)]
        data: Option<String>,

        /// Output root for artifacts. Overrides the config file.
        #[arg(long)]
        out: Option<String>,

        /// Anchor time-of-day (HH:MM). Overrides the config file.
        #[arg(long)]
        anchor: Option<String>,

        /// Resample mode: none, composite, or auto. Overrides the config file.
        #[arg(long)]
        resample: Option<String>,

        /// Row cap for the worst-violations export. Overrides the config file.
        #[arg(long)]
        top_worst: Option<usize>,
    },
    /// Fetch intraday bars into the store.
    Backfill {
        #[command(subcommand)]
        source: BackfillSource,
    },
}

#[derive(Subcommand)]
enum BackfillSource {
    /// Backfill from the Stooq CSV endpoint.
    Stooq {
        /// Symbols to fetch (e.g., SPY QQQ DIA).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to two years ago.
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        to: Option<String>,

        /// Bar interval in minutes.
        #[arg(long, default_value_t = 5)]
        interval: u32,

        /// Path to a TOML config file (for the [stooq] section).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bar store root. Overrides the config file.
        #[arg(long)]
        data: Option<String>,
    },
    /// Backfill from a local Theta terminal.
    Theta {
        /// Symbols to fetch (e.g., SPX NDX).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to two years ago.
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        to: Option<String>,

        /// Bar interval in minutes.
        #[arg(long, default_value_t = 1)]
        interval: u32,

        /// Terminal host. Overrides the config file.
        #[arg(long)]
        host: Option<String>,

        /// Terminal port. Overrides the config file.
        #[arg(long)]
        port: Option<u16>,

        /// Path to a TOML config file (for the [theta] section).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bar store root. Overrides the config file.
        #[arg(long)]
        data: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            symbols,
            config,
            data,
            out,
            anchor,
            resample,
            top_worst,
        } => run_analyze(symbols, config, data, out, anchor, resample, top_worst),
        Commands::Backfill { source } => match source {
            BackfillSource::Stooq {
                symbols,
                from,
                to,
                interval,
                config,
                data,
            } => run_backfill_stooq(symbols, from, to, interval, config, data),
            BackfillSource::Theta {
                symbols,
                from,
                to,
                interval,
                host,
                port,
                config,
                data,
            } => run_backfill_theta(symbols, from, to, interval, host, port, config, data),
        },
    }
}

fn load_config(path: Option<PathBuf>) -> Result<AnalysisConfig> {
    Ok(match path {
        Some(p) => AnalysisConfig::load(&p)?,
        None => AnalysisConfig::default(),
    })
}

fn run_analyze(
    symbols: Vec<String>,
    config_path: Option<PathBuf>,
    data: Option<String>,
    out: Option<String>,
    anchor: Option<String>,
    resample: Option<String>,
    top_worst: Option<usize>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(data) = data {
        config.data_root = data;
    }
    if let Some(out) = out {
        config.output_root = out;
    }
    if !symbols.is_empty() {
        config.symbols = symbols;
    }
    if let Some(anchor) = anchor {
        config.anchor = anchor;
    }
    if let Some(mode) = resample {
        config.resample = mode.parse()?;
    }
    if let Some(n) = top_worst {
        config.top_worst = n;
    }

    let anchor = config.anchor_time()?;
    let store = BarStore::new(&config.data_root);
    let symbols = if config.symbols.is_empty() {
        store.discover_symbols()?
    } else {
        config.symbols.clone()
    };
    if symbols.is_empty() {
        eprintln!("No symbols found under {}", config.data_root);
        std::process::exit(2);
    }

    println!(
        "Analyzing {} symbol(s) from {}",
        symbols.len(),
        config.data_root
    );

    let options = RunOptions {
        anchor,
        resample: config.resample,
    };
    let grid = ThresholdGrid::standard();
    let reports = run_all(&store, &symbols, &options, &grid)?;

    for report in &reports {
        println!(
            "{}: {} days -> {} rows ({} coarsened, {} fallbacks, {} early closes, {} thin dropped)",
            report.symbol,
            report.days_loaded,
            report.rows.len(),
            report.days_coarsened,
            report.fallbacks,
            report.early_close_days,
            report.thin_days_dropped,
        );
    }

    let meta = RunMeta {
        data_root: config.data_root.clone(),
        anchor: config.anchor.clone(),
        resample: config.resample,
        top_worst: config.top_worst,
    };
    let root = save_artifacts(&reports, &grid, &meta, Path::new(&config.output_root))?;
    println!("Artifacts saved to: {}", root.display());

    Ok(())
}

fn run_backfill_stooq(
    symbols: Vec<String>,
    from: Option<String>,
    to: Option<String>,
    interval: u32,
    config_path: Option<PathBuf>,
    data: Option<String>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(data) = data {
        config.data_root = data;
    }
    let (start, end) = parse_range(from, to)?;

    let provider = StooqProvider::new(config.stooq.options());
    backfill_symbols(&provider, &config.data_root, &symbols, interval, start, end)
}

#[allow(clippy::too_many_arguments)]
fn run_backfill_theta(
    symbols: Vec<String>,
    from: Option<String>,
    to: Option<String>,
    interval: u32,
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<PathBuf>,
    data: Option<String>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(data) = data {
        config.data_root = data;
    }
    if let Some(host) = host {
        config.theta.host = host;
    }
    if let Some(port) = port {
        config.theta.port = port;
    }
    let (start, end) = parse_range(from, to)?;

    let provider = ThetaProvider::new(config.theta.options());
    backfill_symbols(&provider, &config.data_root, &symbols, interval, start, end)
}

fn parse_range(start: Option<String>, end: Option<String>) -> Result<(NaiveDate, NaiveDate)> {
    let end_date = end
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let start_date = start
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| end_date - chrono::Duration::days(365 * 2));

    Ok((start_date, end_date))
}

fn backfill_symbols(
    provider: &dyn PriceProvider,
    data_root: &str,
    symbols: &[String],
    interval_mins: u32,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<()> {
    let store = BarStore::new(data_root);
    let options = BackfillOptions {
        interval_mins,
        start,
        end,
    };

    println!(
        "Backfilling {} symbol(s) from {} ({} to {})",
        symbols.len(),
        provider.name(),
        start,
        end
    );

    let mut failures = 0;
    for symbol in symbols {
        match run_backfill(provider, &store, symbol, &options) {
            Ok(summary) => println!(
                "{}: {} bars across {} file(s)",
                summary.symbol, summary.bars_fetched, summary.files_written
            ),
            Err(e) => {
                eprintln!("Error for {symbol}: {e}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
