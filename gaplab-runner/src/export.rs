//! Artifact generation — CSV, JSON, Markdown, and the hashed manifest.
//!
//! A run writes five artifact kinds under the output root:
//! - `daily/{SYMBOL}.csv` — one row per qualifying day, flags per threshold
//! - `summaries/summary_{SYMBOL}.json` — per-threshold aggregates plus run counters
//! - `exceptions/{SYMBOL}_vr_worst.csv` — worst violation ratios across the run
//! - `leaderboard.json` — every (symbol, threshold) summary in one file
//! - `report.md` — human-readable run report
//!
//! `manifest.json` closes the bundle: a blake3 hash and byte size for every
//! artifact written, so a consumer can verify the set.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use gaplab_core::domain::{DailyRow, SummaryRow, ThresholdStats};
use gaplab_core::session::ResampleMode;
use gaplab_core::thresholds::ThresholdGrid;

use crate::runner::SymbolReport;

/// Run-level settings echoed into the report and the manifest.
#[derive(Debug, Clone)]
pub struct RunMeta {
    pub data_root: String,
    pub anchor: String,
    pub resample: ResampleMode,
    /// Row cap for the worst-violations export.
    pub top_worst: usize,
}

// ─── Daily CSV ──────────────────────────────────────────────────────

/// Export a symbol's daily rows as CSV.
///
/// Fixed columns first, then `Qual_{label}`, `Hold_{label}`, `VR_{label}`
/// per grid entry, in grid order. Flags are 0/1 integers; decimal fields
/// print exactly as stored.
pub fn export_daily_csv(rows: &[DailyRow], grid: &ThresholdGrid) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = [
        "Date",
        "PrevClose",
        "Open",
        "AnchorClose",
        "LowAfter",
        "HighAfter",
        "Close",
        "GapPct",
        "ExtraDropPct",
        "ExtraRisePct",
        "TimeToLowMins",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for t in grid.thresholds() {
        header.push(format!("Qual_{}", t.label));
        header.push(format!("Hold_{}", t.label));
        header.push(format!("VR_{}", t.label));
    }
    wtr.write_record(&header)?;

    for row in rows {
        let mut record: Vec<String> = vec![
            row.date.to_string(),
            row.prev_close.to_string(),
            row.open.to_string(),
            row.anchor_close.to_string(),
            row.low_after.to_string(),
            row.high_after.to_string(),
            row.close.to_string(),
            row.gap_pct.to_string(),
            row.extra_drop_pct.to_string(),
            row.extra_rise_pct.to_string(),
            row.time_to_low_mins.to_string(),
        ];
        for t in grid.thresholds() {
            match row.stat_for(t.value) {
                Some(stats) => {
                    record.push(flag(stats.qualify));
                    record.push(flag(stats.hold));
                    record.push(stats.violation_ratio.to_string());
                }
                None => {
                    record.push(flag(false));
                    record.push(flag(false));
                    record.push(Decimal::ZERO.to_string());
                }
            }
        }
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn flag(b: bool) -> String {
    if b { "1" } else { "0" }.to_string()
}

// ─── Worst violations CSV ───────────────────────────────────────────

/// Export the worst violation ratios as CSV.
///
/// Every (day, threshold) pair with a positive violation ratio is a
/// candidate, qualifying or not. Sorted by ratio descending, earlier date
/// first on ties, truncated to `top_worst` rows.
pub fn export_worst_vr_csv(
    rows: &[DailyRow],
    grid: &ThresholdGrid,
    top_worst: usize,
) -> Result<String> {
    struct Worst<'a> {
        label: &'a str,
        stats: &'a ThresholdStats,
        row: &'a DailyRow,
    }

    let mut worst: Vec<Worst> = Vec::new();
    for row in rows {
        for t in grid.thresholds() {
            if let Some(stats) = row.stat_for(t.value) {
                if stats.violation_ratio > Decimal::ZERO {
                    worst.push(Worst {
                        label: &t.label,
                        stats,
                        row,
                    });
                }
            }
        }
    }
    worst.sort_by(|a, b| {
        b.stats
            .violation_ratio
            .cmp(&a.stats.violation_ratio)
            .then(a.row.date.cmp(&b.row.date))
    });
    worst.truncate(top_worst);

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "Date",
        "Threshold",
        "ViolationRatio",
        "Qualify",
        "Hold",
        "GapPct",
        "ExtraDropPct",
    ])?;
    for w in &worst {
        wtr.write_record([
            &w.row.date.to_string(),
            w.label,
            &w.stats.violation_ratio.to_string(),
            &flag(w.stats.qualify),
            &flag(w.stats.hold),
            &w.row.gap_pct.to_string(),
            &w.row.extra_drop_pct.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Summary JSON ───────────────────────────────────────────────────

#[derive(Serialize)]
struct SummaryArtifact<'a> {
    symbol: &'a str,
    generated_utc: String,
    anchor: &'a str,
    days_loaded: usize,
    thin_days_dropped: usize,
    days_coarsened: usize,
    fallbacks: usize,
    early_close_days: usize,
    thresholds: &'a [SummaryRow],
}

/// Serialize a symbol's cross-day summary (and run counters) to pretty JSON.
pub fn export_summary_json(report: &SymbolReport, anchor: &str) -> Result<String> {
    let artifact = SummaryArtifact {
        symbol: &report.symbol,
        generated_utc: Utc::now().to_rfc3339(),
        anchor,
        days_loaded: report.days_loaded,
        thin_days_dropped: report.thin_days_dropped,
        days_coarsened: report.days_coarsened,
        fallbacks: report.fallbacks,
        early_close_days: report.early_close_days,
        thresholds: &report.summaries,
    };
    serde_json::to_string_pretty(&artifact).context("failed to serialize symbol summary to JSON")
}

// ─── Leaderboard JSON ───────────────────────────────────────────────

#[derive(Serialize)]
struct LeaderboardEntry<'a> {
    symbol: &'a str,
    #[serde(flatten)]
    summary: &'a SummaryRow,
}

#[derive(Serialize)]
struct Leaderboard<'a> {
    generated_utc: String,
    entries: Vec<LeaderboardEntry<'a>>,
}

/// Serialize every (symbol, threshold) summary to one pretty-JSON file.
///
/// Symbols sort ascending; within a symbol, entries keep grid order.
pub fn export_leaderboard_json(reports: &[SymbolReport]) -> Result<String> {
    let mut sorted: Vec<&SymbolReport> = reports.iter().collect();
    sorted.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let entries: Vec<LeaderboardEntry> = sorted
        .iter()
        .flat_map(|r| {
            r.summaries.iter().map(|summary| LeaderboardEntry {
                symbol: &r.symbol,
                summary,
            })
        })
        .collect();

    let leaderboard = Leaderboard {
        generated_utc: Utc::now().to_rfc3339(),
        entries,
    };
    serde_json::to_string_pretty(&leaderboard).context("failed to serialize leaderboard to JSON")
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate the run-level Markdown report.
pub fn generate_report(reports: &[SymbolReport], grid: &ThresholdGrid, meta: &RunMeta) -> String {
    let mut md = String::with_capacity(4096);

    md.push_str("# Gap Containment Report\n\n");

    // Run Configuration
    md.push_str("## Run Configuration\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Generated | {} |\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("| Data Root | {} |\n", meta.data_root));
    md.push_str(&format!("| Anchor | {} |\n", meta.anchor));
    md.push_str(&format!("| Resample | {} |\n", meta.resample));
    md.push_str(&format!("| Thresholds | {} |\n", grid.labels().join(", ")));
    md.push_str(&format!(
        "| Symbols | {} |\n",
        reports
            .iter()
            .map(|r| r.symbol.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    md.push('\n');

    // Per-symbol sections
    for report in reports {
        md.push_str(&format!("## {}\n\n", report.symbol));
        md.push_str(&format!(
            "{} days loaded, {} coarsened, {} fallbacks, {} early closes, {} thin days dropped; {} rows.\n\n",
            report.days_loaded,
            report.days_coarsened,
            report.fallbacks,
            report.early_close_days,
            report.thin_days_dropped,
            report.rows.len(),
        ));

        md.push_str("| Threshold | N | Hits | Hit Rate | Wilson Lower 95% | P99 VR | Median TTL (min) |\n");
        md.push_str("| --- | --- | --- | --- | --- | --- | --- |\n");
        for s in &report.summaries {
            md.push_str(&format!(
                "| {} | {} | {} | {:.1}% | {:.1}% | {} | {} |\n",
                s.threshold,
                s.n,
                s.hits,
                s.hit_rate * 100.0,
                s.wilson_lower95 * 100.0,
                s.p99_violation_ratio,
                s.median_time_to_low_mins,
            ));
        }
        md.push('\n');
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

#[derive(Serialize)]
struct ArtifactEntry {
    path: String,
    blake3: String,
    bytes: usize,
}

#[derive(Serialize)]
struct Manifest<'a> {
    generated_utc: String,
    data_root: &'a str,
    anchor: &'a str,
    resample: ResampleMode,
    symbols: Vec<&'a str>,
    thresholds: Vec<String>,
    artifacts: Vec<ArtifactEntry>,
}

fn write_artifact(
    root: &Path,
    rel: &str,
    content: &str,
    entries: &mut Vec<ArtifactEntry>,
) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create artifact dir: {}", parent.display()))?;
    }
    std::fs::write(&path, content)
        .with_context(|| format!("failed to write {}", path.display()))?;
    entries.push(ArtifactEntry {
        path: rel.to_string(),
        blake3: blake3::hash(content.as_bytes()).to_hex().to_string(),
        bytes: content.len(),
    });
    Ok(())
}

/// Write the full artifact set for a run under `output_root`.
///
/// `manifest.json` goes last and lists everything else: relative path,
/// blake3 hash, byte size. The manifest does not list itself.
///
/// Returns the output root.
pub fn save_artifacts(
    reports: &[SymbolReport],
    grid: &ThresholdGrid,
    meta: &RunMeta,
    output_root: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_root)
        .with_context(|| format!("failed to create output dir: {}", output_root.display()))?;

    let mut entries: Vec<ArtifactEntry> = Vec::new();

    for report in reports {
        let daily = export_daily_csv(&report.rows, grid)?;
        write_artifact(
            output_root,
            &format!("daily/{}.csv", report.symbol),
            &daily,
            &mut entries,
        )?;

        let summary = export_summary_json(report, &meta.anchor)?;
        write_artifact(
            output_root,
            &format!("summaries/summary_{}.json", report.symbol),
            &summary,
            &mut entries,
        )?;

        let worst = export_worst_vr_csv(&report.rows, grid, meta.top_worst)?;
        write_artifact(
            output_root,
            &format!("exceptions/{}_vr_worst.csv", report.symbol),
            &worst,
            &mut entries,
        )?;
    }

    let leaderboard = export_leaderboard_json(reports)?;
    write_artifact(output_root, "leaderboard.json", &leaderboard, &mut entries)?;

    let report_md = generate_report(reports, grid, meta);
    write_artifact(output_root, "report.md", &report_md, &mut entries)?;

    let manifest = Manifest {
        generated_utc: Utc::now().to_rfc3339(),
        data_root: &meta.data_root,
        anchor: &meta.anchor,
        resample: meta.resample,
        symbols: reports.iter().map(|r| r.symbol.as_str()).collect(),
        thresholds: grid.labels(),
        artifacts: entries,
    };
    let manifest_json =
        serde_json::to_string_pretty(&manifest).context("failed to serialize manifest to JSON")?;
    let manifest_path = output_root.join("manifest.json");
    std::fs::write(&manifest_path, &manifest_json)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    Ok(output_root.to_path_buf())
}
