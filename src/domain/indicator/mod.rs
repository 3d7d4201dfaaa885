//! Range-based indicator series.
//!
//! - `IndicatorPoint`: one dated value, `None` while the indicator is warming up
//! - `IndicatorType`: indicator identity + parameters
//! - `IndicatorSeries`: a series aligned 1:1 with the bars it was built from

pub mod adr;
pub mod range;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Range,
    Adr(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at position `i`; `None` when out of bounds or undefined.
    pub fn value_at(&self, i: usize) -> Option<f64> {
        self.values.get(i).and_then(|p| p.value)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Range => write!(f, "RANGE"),
            IndicatorType::Adr(period) => write!(f, "ADR({})", period),
        }
    }
}
