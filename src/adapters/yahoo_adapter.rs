//! Yahoo Finance history adapter.
//!
//! Reads daily bars from the v8 chart API. One request per fetch, no retries:
//! the caller decides whether to try again. Timestamps are reduced to their
//! UTC calendar date here so the domain only ever sees `NaiveDate`.

use crate::domain::error::AdrError;
use crate::domain::ohlcv::DailyBar;
use crate::ports::history_port::HistoryPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<i64>>,
}

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooAdapter {
    pub fn new(timeout: Duration) -> Result<Self, AdrError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) adrgate")
            .build()
            .map_err(|e| AdrError::unavailable("yahoo", e.to_string()))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive on Yahoo's side; ask for the day after `end`.
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "{}/{}?period1={}&period2={}&interval=1d",
            self.base_url,
            encode_symbol(symbol),
            start_ts,
            end_ts
        )
    }
}

fn encode_symbol(symbol: &str) -> String {
    symbol.replace('^', "%5E")
}

fn parse_response(
    symbol: &str,
    resp: ChartResponse,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyBar>, AdrError> {
    let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
        Some(err) => AdrError::unavailable(symbol, format!("{}: {}", err.code, err.description)),
        None => AdrError::unavailable(symbol, "empty result with no error"),
    })?;

    let data = result
        .into_iter()
        .next()
        .ok_or_else(|| AdrError::unavailable(symbol, "result array is empty"))?;

    // A valid symbol with no trading days in range has no timestamps.
    let timestamps = data.timestamp.unwrap_or_default();

    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| AdrError::unavailable(symbol, "no quote data"))?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| AdrError::unavailable(symbol, format!("invalid timestamp: {}", ts)))?;

        if date < start || date > end {
            continue;
        }

        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();

        // Holidays come back as all-null rows.
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
            continue;
        }

        bars.push(DailyBar {
            date,
            open: open.unwrap_or(f64::NAN),
            high: high.unwrap_or(f64::NAN),
            low: low.unwrap_or(f64::NAN),
            close: close.unwrap_or(f64::NAN),
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
        });
    }

    // Intraday updates can repeat the last day under a second timestamp.
    bars.dedup_by(|later, earlier| {
        if later.date == earlier.date {
            *earlier = later.clone();
            true
        } else {
            false
        }
    });

    Ok(bars)
}

impl HistoryPort for YahooAdapter {
    fn fetch_daily_history(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, AdrError> {
        let url = self.chart_url(instrument, start, end);
        debug!(%url, "requesting Yahoo chart");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AdrError::unavailable(instrument, e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AdrError::unavailable(instrument, "symbol not found"));
        }
        if !status.is_success() {
            warn!(%status, instrument, "Yahoo request failed");
            return Err(AdrError::unavailable(instrument, format!("HTTP {}", status)));
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            AdrError::unavailable(instrument, format!("failed to parse response: {}", e))
        })?;

        parse_response(instrument, chart, start, end)
    }

    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AdrError> {
        let end = chrono::Local::now().date_naive();
        let start = NaiveDate::from_ymd_opt(1985, 1, 1).unwrap_or(NaiveDate::MIN);
        let bars = self.fetch_daily_history(instrument, start, end)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
