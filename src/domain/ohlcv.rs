//! Daily OHLCV bar representation.

use crate::domain::error::BarDefect;
use chrono::NaiveDate;

/// One trading day. Open, close and volume are carried for the providers and
/// the report; the decision only reads high and low.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl DailyBar {
    /// high - low
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Checks the bar on its own: finite high/low and high >= low.
    pub fn defect(&self) -> Option<BarDefect> {
        if !self.high.is_finite() || !self.low.is_finite() {
            Some(BarDefect::NonFinite)
        } else if self.high < self.low {
            Some(BarDefect::HighBelowLow)
        } else {
            None
        }
    }
}
