#![allow(dead_code)]

use adrgate::domain::error::AdrError;
pub use adrgate::domain::ohlcv::DailyBar;
use adrgate::ports::history_port::HistoryPort;
use chrono::{Datelike, NaiveDate, Weekday};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub struct MockHistoryPort {
    pub data: HashMap<String, Vec<DailyBar>>,
    pub errors: HashMap<String, String>,
    pub calls: Cell<usize>,
    pub last_range: RefCell<Option<(NaiveDate, NaiveDate)>>,
}

impl MockHistoryPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: Cell::new(0),
            last_range: RefCell::new(None),
        }
    }

    pub fn with_bars(mut self, instrument: &str, bars: Vec<DailyBar>) -> Self {
        self.data.insert(instrument.to_string(), bars);
        self
    }

    pub fn with_error(mut self, instrument: &str, reason: &str) -> Self {
        self.errors.insert(instrument.to_string(), reason.to_string());
        self
    }
}

impl HistoryPort for MockHistoryPort {
    fn fetch_daily_history(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, AdrError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_range.borrow_mut() = Some((start, end));

        if let Some(reason) = self.errors.get(instrument) {
            return Err(AdrError::unavailable(instrument, reason.clone()));
        }
        match self.data.get(instrument) {
            Some(bars) => Ok(bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .cloned()
                .collect()),
            None => Err(AdrError::unavailable(instrument, "unknown instrument")),
        }
    }

    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AdrError> {
        if let Some(reason) = self.errors.get(instrument) {
            return Err(AdrError::unavailable(instrument, reason.clone()));
        }
        Ok(self.data.get(instrument).and_then(|bars| {
            let first = bars.first()?;
            let last = bars.last()?;
            Some((first.date, last.date, bars.len()))
        }))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: NaiveDate, high: f64, low: f64) -> DailyBar {
    DailyBar {
        date,
        open: low,
        high,
        low,
        close: (high + low) / 2.0,
        volume: 10_000,
    }
}

/// Bars on consecutive weekdays from `start`, one per range, low fixed at 16000.
pub fn business_bars(start: NaiveDate, ranges: &[f64]) -> Vec<DailyBar> {
    let mut bars = Vec::with_capacity(ranges.len());
    let mut d = start;
    for &r in ranges {
        while matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            d = d.succ_opt().unwrap();
        }
        bars.push(make_bar(d, 16_000.0 + r, 16_000.0));
        d = d.succ_opt().unwrap();
    }
    bars
}

/// First weekday after the last bar.
pub fn next_trading_day(bars: &[DailyBar]) -> NaiveDate {
    let mut d = bars.last().unwrap().date.succ_opt().unwrap();
    while matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
        d = d.succ_opt().unwrap();
    }
    d
}

/// Twenty bars of range 10 with a final spike of 50.
pub fn spike_history() -> Vec<DailyBar> {
    let mut ranges = vec![10.0; 19];
    ranges.push(50.0);
    business_bars(date(2024, 1, 2), &ranges)
}

pub fn write_csv(dir: &std::path::Path, file_name: &str, bars: &[DailyBar]) {
    let mut content = String::from("Date,Open,High,Low,Close,Volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    std::fs::write(dir.join(file_name), content).unwrap();
}
