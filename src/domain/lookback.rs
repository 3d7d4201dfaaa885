//! How much history to request for a target date.

use chrono::{Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_FULL_START: (i32, u32, u32) = (2000, 1, 1);
pub const DEFAULT_TRAILING_DAYS: u32 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryLookback {
    /// Everything from a fixed start date through the target date.
    Full { start: NaiveDate },
    /// The last `calendar_days` days through the target date.
    Trailing { calendar_days: u32 },
}

impl HistoryLookback {
    pub fn default_full() -> Self {
        let (y, m, d) = DEFAULT_FULL_START;
        HistoryLookback::Full {
            start: NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN),
        }
    }

    /// Inclusive `(start, end)` range to fetch for `target`.
    pub fn fetch_range(&self, target: NaiveDate) -> (NaiveDate, NaiveDate) {
        match *self {
            HistoryLookback::Full { start } => (start.min(target), target),
            HistoryLookback::Trailing { calendar_days } => {
                let start = target
                    .checked_sub_signed(Duration::days(i64::from(calendar_days)))
                    .unwrap_or(NaiveDate::MIN);
                (start, target)
            }
        }
    }
}

impl Default for HistoryLookback {
    fn default() -> Self {
        Self::default_full()
    }
}

impl fmt::Display for HistoryLookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryLookback::Full { start } => write!(f, "full since {}", start),
            HistoryLookback::Trailing { calendar_days } => {
                write!(f, "trailing {} days", calendar_days)
            }
        }
    }
}

/// Lookback kind as written in config files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookbackKind {
    Full,
    Trailing,
}

impl FromStr for LookbackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(LookbackKind::Full),
            "trailing" => Ok(LookbackKind::Trailing),
            other => Err(format!("unknown lookback '{}' (expected full or trailing)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn full_runs_from_2000_through_target() {
        let (start, end) = HistoryLookback::default().fetch_range(date(2024, 5, 10));
        assert_eq!(start, date(2000, 1, 1));
        assert_eq!(end, date(2024, 5, 10));
    }

    #[test]
    fn full_with_target_before_start_is_empty_range_at_target() {
        let lookback = HistoryLookback::Full {
            start: date(2010, 1, 1),
        };
        assert_eq!(
            lookback.fetch_range(date(2005, 3, 1)),
            (date(2005, 3, 1), date(2005, 3, 1))
        );
    }

    #[test]
    fn trailing_counts_calendar_days() {
        let lookback = HistoryLookback::Trailing { calendar_days: 45 };
        let (start, end) = lookback.fetch_range(date(2024, 3, 15));
        assert_eq!(start, date(2024, 1, 30));
        assert_eq!(end, date(2024, 3, 15));
    }

    #[test]
    fn parse_kind() {
        assert_eq!("full".parse::<LookbackKind>(), Ok(LookbackKind::Full));
        assert_eq!(" Trailing ".parse::<LookbackKind>(), Ok(LookbackKind::Trailing));
        assert!("weekly".parse::<LookbackKind>().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(
            HistoryLookback::default().to_string(),
            "full since 2000-01-01"
        );
        assert_eq!(
            HistoryLookback::Trailing { calendar_days: 30 }.to_string(),
            "trailing 30 days"
        );
    }
}
