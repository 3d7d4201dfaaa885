//! CSV directory history adapter.
//!
//! One file per instrument, `<base>/<NAME>.csv`, where `NAME` is the
//! instrument with characters outside `[A-Za-z0-9._-]` dropped (`^NDX` is
//! read from `NDX.csv`). Columns are found by header name, so Yahoo-style
//! exports with an extra `Adj Close` column load as-is.

use crate::domain::error::AdrError;
use crate::domain::ohlcv::DailyBar;
use crate::ports::history_port::HistoryPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(instrument: &str, headers: &csv::StringRecord) -> Result<Self, AdrError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name)
                .ok_or_else(|| AdrError::unavailable(instrument, format!("missing {} column", name)))
        };

        Ok(Self {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn file_name(instrument: &str) -> String {
        let name: String = instrument
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            .collect();
        format!("{}.csv", name)
    }

    fn csv_path(&self, instrument: &str) -> PathBuf {
        self.base_path.join(Self::file_name(instrument))
    }

    /// Reads every bar in `path`, sorted by date.
    pub fn read_file(path: &Path, instrument: &str) -> Result<Vec<DailyBar>, AdrError> {
        read_bars(path, instrument, NaiveDate::MIN, NaiveDate::MAX)
    }
}

fn parse_price(instrument: &str, field: &str, value: Option<&str>) -> Result<f64, AdrError> {
    value
        .ok_or_else(|| AdrError::unavailable(instrument, format!("missing {} value", field)))?
        .trim()
        .parse()
        .map_err(|e| AdrError::unavailable(instrument, format!("invalid {} value: {}", field, e)))
}

/// Yahoo and yfinance exports write `null` (or leave the cell empty) for
/// prices on market holidays.
fn is_missing(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => true,
        Some(v) => v.eq_ignore_ascii_case("null") || v.eq_ignore_ascii_case("nan"),
    }
}

fn parse_volume(instrument: &str, value: Option<&str>) -> Result<i64, AdrError> {
    let raw = match value.map(str::trim) {
        None | Some("") => return Ok(0),
        Some(v) => v,
    };
    raw.parse::<i64>()
        .or_else(|_| raw.parse::<f64>().map(|v| v.round() as i64))
        .map_err(|e| AdrError::unavailable(instrument, format!("invalid volume value: {}", e)))
}

fn read_bars(
    path: &Path,
    instrument: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<DailyBar>, AdrError> {
    let content = fs::read_to_string(path).map_err(|e| {
        AdrError::unavailable(instrument, format!("failed to read {}: {}", path.display(), e))
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| AdrError::unavailable(instrument, format!("CSV parse error: {}", e)))?
        .clone();
    let cols = Columns::from_headers(instrument, &headers)?;

    let mut bars = Vec::new();
    for result in rdr.records() {
        let record = result
            .map_err(|e| AdrError::unavailable(instrument, format!("CSV parse error: {}", e)))?;

        let date_str = record
            .get(cols.date)
            .ok_or_else(|| AdrError::unavailable(instrument, "missing date value"))?;
        // Timestamped exports carry a time part; only the calendar date counts.
        let date_part = date_str.trim().get(..10).unwrap_or(date_str.trim());
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| {
            AdrError::unavailable(instrument, format!("invalid date '{}': {}", date_str, e))
        })?;

        if date < start_date || date > end_date {
            continue;
        }

        if [cols.open, cols.high, cols.low, cols.close]
            .iter()
            .all(|&i| is_missing(record.get(i)))
        {
            debug!(instrument, %date, "skipping row with no prices");
            continue;
        }

        bars.push(DailyBar {
            date,
            open: parse_price(instrument, "open", record.get(cols.open))?,
            high: parse_price(instrument, "high", record.get(cols.high))?,
            low: parse_price(instrument, "low", record.get(cols.low))?,
            close: parse_price(instrument, "close", record.get(cols.close))?,
            volume: parse_volume(instrument, cols.volume.and_then(|i| record.get(i)))?,
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

impl HistoryPort for CsvAdapter {
    fn fetch_daily_history(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, AdrError> {
        let path = self.csv_path(instrument);
        debug!(path = %path.display(), "reading CSV history");
        read_bars(&path, instrument, start, end)
    }

    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AdrError> {
        let path = self.csv_path(instrument);
        let bars = Self::read_file(&path, instrument)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
