//! Stooq-style intraday history provider.
//!
//! Fetches the public CSV endpoint, one request per symbol. The response
//! format drifts (separators, header presence, date shapes), so parsing is
//! deliberately liberal: recognizable rows are kept, everything else is
//! skipped without error.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::time::Duration;

use super::provider::{PriceProvider, ProviderError};
use super::rate_limit::RateLimiter;
use crate::domain::Bar;

const DEFAULT_URL_TEMPLATE: &str = "https://stooq.com/q/d/l/?s={SYMBOL}&i={INTERVAL}";

/// Connection settings for the Stooq endpoint.
#[derive(Debug, Clone)]
pub struct StooqOptions {
    /// URL template with `{SYMBOL}` and `{INTERVAL}` placeholders.
    pub url_template: String,
    /// Explicit symbol translations; anything absent falls back to the
    /// lowercase US suffix convention (`SPY` → `spy.us`).
    pub symbol_map: BTreeMap<String, String>,
    /// Minimum gap between requests.
    pub throttle: Duration,
    pub max_retries: u32,
}

impl Default for StooqOptions {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            symbol_map: BTreeMap::new(),
            throttle: Duration::from_millis(250),
            max_retries: 3,
        }
    }
}

/// Stooq intraday provider.
pub struct StooqProvider {
    client: reqwest::blocking::Client,
    limiter: RateLimiter,
    url_template: String,
    symbol_map: BTreeMap<String, String>,
    max_retries: u32,
    base_delay: Duration,
}

impl StooqProvider {
    pub fn new(options: StooqOptions) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("gaplab/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            limiter: RateLimiter::new(options.throttle),
            url_template: options.url_template,
            symbol_map: options.symbol_map,
            max_retries: options.max_retries,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Translate a local symbol into Stooq's naming.
    fn map_symbol(&self, symbol: &str) -> String {
        self.symbol_map
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| format!("{}.us", symbol.to_ascii_lowercase()))
    }

    fn fetch_with_retry(&self, symbol: &str, interval_mins: u32) -> Result<Vec<Bar>, ProviderError> {
        let mapped = self.map_symbol(symbol);
        let url = self
            .url_template
            .replace("{SYMBOL}", &mapped)
            .replace("{INTERVAL}", &interval_mins.to_string());
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }
            self.limiter.wait();

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        last_error = Some(ProviderError::HttpStatus {
                            status: status.as_u16(),
                            symbol: symbol.to_string(),
                        });
                        continue;
                    }
                    let body = resp.text().map_err(|e| {
                        ProviderError::ResponseFormat(format!("reading body for {symbol}: {e}"))
                    })?;
                    return Ok(parse_csv(&body));
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(ProviderError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(ProviderError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::Other("max retries exceeded".into())))
    }
}

impl PriceProvider for StooqProvider {
    fn name(&self) -> &str {
        "stooq"
    }

    fn fetch_intraday(
        &self,
        symbol: &str,
        interval_mins: u32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, ProviderError> {
        // The endpoint takes no date range; fetch everything and trim.
        let mut bars = self.fetch_with_retry(symbol, interval_mins)?;
        bars.retain(|b| {
            let d = b.timestamp.date();
            d >= start && d <= end
        });
        Ok(bars)
    }
}

/// Parse a Stooq CSV body into chronologically sorted bars.
///
/// Accepts comma or semicolon separators, an optional header (any field
/// named `Date` or `Time`), split Date+Time columns or a combined leading
/// datetime, and takes OHLCV from the trailing five columns. Rows that do
/// not parse, or fail the bar sanity check, are skipped.
fn parse_csv(text: &str) -> Vec<Bar> {
    let mut bars = Vec::new();
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let Some(first) = lines.next() else {
        return bars;
    };
    let sep = if first.contains(';') { ';' } else { ',' };

    let first_fields: Vec<&str> = first.split(sep).map(str::trim).collect();
    let has_header = first_fields
        .iter()
        .any(|f| f.eq_ignore_ascii_case("date") || f.eq_ignore_ascii_case("time"));
    if !has_header {
        if let Some(bar) = parse_row(&first_fields) {
            bars.push(bar);
        }
    }

    for line in lines {
        let fields: Vec<&str> = line.split(sep).map(str::trim).collect();
        if let Some(bar) = parse_row(&fields) {
            bars.push(bar);
        }
    }

    bars.sort_by_key(|b| b.timestamp);
    bars
}

fn parse_row(fields: &[&str]) -> Option<Bar> {
    if fields.len() < 6 {
        return None;
    }
    let timestamp = if fields.len() >= 7 {
        parse_datetime(&format!("{} {}", fields[0], fields[1]))
    } else {
        None
    }
    .or_else(|| parse_datetime(fields[0]))?;

    let tail = &fields[fields.len() - 5..];
    let open = tail[0].parse::<Decimal>().ok()?;
    let high = tail[1].parse::<Decimal>().ok()?;
    let low = tail[2].parse::<Decimal>().ok()?;
    let close = tail[3].parse::<Decimal>().ok()?;
    let volume = tail[4].parse::<u64>().unwrap_or(0);

    let bar = Bar {
        timestamp,
        open,
        high,
        low,
        close,
        volume,
    };
    bar.is_sane().then_some(bar)
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y%m%d %H:%M:%S",
        "%Y%m%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}
