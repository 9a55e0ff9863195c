//! Theta-style local terminal provider.
//!
//! Talks to a locally running terminal process over REST. Unlike the public
//! CSV endpoint, history must be pulled one trading date at a time, so a
//! fetch is: list available dates, trim to the requested range, then one
//! history request per date.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::time::Duration;

use super::provider::{PriceProvider, ProviderError};
use super::rate_limit::RateLimiter;
use crate::domain::Bar;

/// Connection settings for the local terminal.
#[derive(Debug, Clone)]
pub struct ThetaOptions {
    pub host: String,
    pub port: u16,
    /// Minimum gap between requests.
    pub throttle: Duration,
    pub max_retries: u32,
}

impl Default for ThetaOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 25503,
            throttle: Duration::from_millis(250),
            max_retries: 3,
        }
    }
}

/// Theta terminal intraday provider.
pub struct ThetaProvider {
    client: reqwest::blocking::Client,
    limiter: RateLimiter,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl ThetaProvider {
    pub fn new(options: ThetaOptions) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("gaplab/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            limiter: RateLimiter::new(options.throttle),
            base_url: format!("http://{}:{}/v3", options.host, options.port),
            max_retries: options.max_retries,
            base_delay: Duration::from_millis(200),
        }
    }

    fn get_with_retry(&self, url: &str, symbol: &str) -> Result<String, ProviderError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }
            self.limiter.wait();

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        last_error = Some(ProviderError::HttpStatus {
                            status: status.as_u16(),
                            symbol: symbol.to_string(),
                        });
                        continue;
                    }
                    return resp.text().map_err(|e| {
                        ProviderError::ResponseFormat(format!("reading body for {symbol}: {e}"))
                    });
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

    fn list_dates(&self, symbol: &str) -> Result<Vec<NaiveDate>, ProviderError> {
        let url = format!(
            "{}/index/list/dates?symbol={}&format=csv",
            self.base_url, symbol
        );
        let body = self.get_with_retry(&url, symbol)?;
        Ok(parse_dates_csv(&body))
    }

    fn fetch_day(
        &self,
        symbol: &str,
        date: NaiveDate,
        interval: &str,
    ) -> Result<Vec<Bar>, ProviderError> {
        let ymd = date.format("%Y%m%d");
        let url = format!(
            "{}/index/history/ohlc?symbol={}&start_date={}&end_date={}&interval={}&format=csv",
            self.base_url, symbol, ymd, ymd, interval
        );
        let body = self.get_with_retry(&url, symbol)?;
        Ok(parse_history_csv(&body))
    }
}

impl PriceProvider for ThetaProvider {
    fn name(&self) -> &str {
        "theta"
    }

    fn fetch_intraday(
        &self,
        symbol: &str,
        interval_mins: u32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, ProviderError> {
        let interval = interval_string(interval_mins);
        let mut dates = self.list_dates(symbol)?;
        dates.retain(|d| *d >= start && *d <= end);

        let mut bars = Vec::new();
        for date in dates {
            bars.extend(self.fetch_day(symbol, date, interval)?);
        }
        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

/// Terminal interval names for the minute counts we request.
fn interval_string(interval_mins: u32) -> &'static str {
    match interval_mins {
        1 => "1m",
        5 => "5m",
        10 => "10m",
        15 => "15m",
        30 => "30m",
        60 => "1h",
        _ => "1m",
    }
}

/// Parse a `symbol,date` listing into sorted unique dates.
fn parse_dates_csv(text: &str) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let raw = if fields.len() >= 2 { fields[1] } else { fields[0] };
            parse_date(raw)
        })
        .collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
}

/// Parse history rows `timestamp,open,high,low,close,volume,...` into
/// chronologically sorted bars. Trailing columns and unparseable rows are
/// ignored; bars failing the sanity check are skipped.
fn parse_history_csv(text: &str) -> Vec<Bar> {
    let mut bars: Vec<Bar> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            parse_history_row(&fields)
        })
        .collect();
    bars.sort_by_key(|b| b.timestamp);
    bars
}

fn parse_history_row(fields: &[&str]) -> Option<Bar> {
    if fields.len() < 6 {
        return None;
    }
    let timestamp = parse_timestamp(fields[0])?;
    let open = fields[1].parse::<Decimal>().ok()?;
    let high = fields[2].parse::<Decimal>().ok()?;
    let low = fields[3].parse::<Decimal>().ok()?;
    let close = fields[4].parse::<Decimal>().ok()?;
    let volume = fields[5].parse::<u64>().unwrap_or(0);

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

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // ─── Interval names ─────────────────────────────────────────────────

    #[test]
    fn interval_names_cover_the_terminal_grid() {
        assert_eq!(interval_string(1), "1m");
        assert_eq!(interval_string(5), "5m");
        assert_eq!(interval_string(10), "10m");
        assert_eq!(interval_string(15), "15m");
        assert_eq!(interval_string(30), "30m");
        assert_eq!(interval_string(60), "1h");
        assert_eq!(interval_string(7), "1m");
    }

    // ─── Date listing ───────────────────────────────────────────────────

    #[test]
    fn parses_symbol_date_listing() {
        let body = "symbol,date\nSPX,2024-01-04\nSPX,2024-01-03\nSPX,2024-01-03\n";
        let dates = parse_dates_csv(body);
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            ]
        );
    }

    #[test]
    fn parses_compact_single_column_dates() {
        let body = "20240103\n20240104\n";
        let dates = parse_dates_csv(body);
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
    }

    // ─── History parsing ────────────────────────────────────────────────

    #[test]
    fn parses_iso_timestamps_with_fractional_seconds() {
        let body = "timestamp,open,high,low,close,volume,count\n\
                    2024-01-03T09:31:00.000,98.2,98.5,98.1,98.4,1200,17\n\
                    2024-01-03T09:32:00,98.4,98.6,98.3,98.5,900,12\n";
        let bars = parse_history_csv(body);
        assert_eq!(bars.len(), 2);
        assert_eq!(
            bars[0].timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 3)
                .unwrap()
                .and_hms_opt(9, 31, 0)
                .unwrap()
        );
        assert_eq!(bars[0].open, dec!(98.2));
        assert_eq!(bars[0].volume, 1200);
    }

    #[test]
    fn parses_space_separated_timestamps() {
        let body = "2024-01-03 09:31:00,98.2,98.5,98.1,98.4,1200\n";
        let bars = parse_history_csv(body);
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn skips_malformed_history_rows() {
        let body = "timestamp,open,high,low,close,volume\n\
                    2024-01-03T09:31:00,98.2,98.5,98.1,98.4,1200\n\
                    garbage line\n\
                    2024-01-03T09:32:00,xx,98.6,98.3,98.5,900\n\
                    2024-01-03T09:33:00,98.2,97.0,98.1,98.4,100\n";
        let bars = parse_history_csv(body);
        assert_eq!(bars.len(), 1);
    }

    #[test]
    fn sorts_history_output() {
        let body = "2024-01-03T09:32:00,98.4,98.6,98.3,98.5,900\n\
                    2024-01-03T09:31:00,98.2,98.5,98.1,98.4,1200\n";
        let bars = parse_history_csv(body);
        assert!(bars[0].timestamp < bars[1].timestamp);
    }
}
