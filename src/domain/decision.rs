//! ADR trade gate.
//!
//! Compares yesterday's realized range ("Day 1") with the mean ADR of the
//! days before it ("3-Day ADR"). A Day 1 range strictly greater than the
//! 3-Day ADR denies trading on the target date; ties allow it.
//!
//! The trailing window holds the `lagging_bars` most recent bars strictly
//! before the target date in reverse chronological order: index 0 is Day 1,
//! indices `1..=adr_compare_bars` feed the comparison, and indices
//! `1..lagging_bars` make up the detail table shown on denial.

use crate::domain::error::{BarDefect, InsufficientData};
use crate::domain::indicator::adr::calculate_adr;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::ohlcv::DailyBar;
use chrono::NaiveDate;

pub const DEFAULT_WINDOW_SIZE: usize = 14;
pub const DEFAULT_LAGGING_BARS: usize = 6;
pub const DEFAULT_ADR_COMPARE_BARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamsError {
    #[error("window_size must be at least 1")]
    ZeroWindow,

    #[error("adr_compare_bars must be at least 1")]
    ZeroCompare,

    #[error("lagging_bars ({lagging}) must exceed adr_compare_bars ({compare})")]
    LaggingTooShort { lagging: usize, compare: usize },
}

/// Window sizes of the rule. Only constructible in a consistent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionParams {
    window_size: usize,
    lagging_bars: usize,
    adr_compare_bars: usize,
}

impl DecisionParams {
    pub fn new(
        window_size: usize,
        lagging_bars: usize,
        adr_compare_bars: usize,
    ) -> Result<Self, ParamsError> {
        if window_size == 0 {
            return Err(ParamsError::ZeroWindow);
        }
        if adr_compare_bars == 0 {
            return Err(ParamsError::ZeroCompare);
        }
        if lagging_bars <= adr_compare_bars {
            return Err(ParamsError::LaggingTooShort {
                lagging: lagging_bars,
                compare: adr_compare_bars,
            });
        }
        Ok(Self {
            window_size,
            lagging_bars,
            adr_compare_bars,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn lagging_bars(&self) -> usize {
        self.lagging_bars
    }

    pub fn adr_compare_bars(&self) -> usize {
        self.adr_compare_bars
    }

    /// Rows needed before any decision is attempted.
    pub fn min_history(&self) -> usize {
        self.window_size + self.lagging_bars
    }
}

impl Default for DecisionParams {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            lagging_bars: DEFAULT_LAGGING_BARS,
            adr_compare_bars: DEFAULT_ADR_COMPARE_BARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub adr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub target_date: NaiveDate,
    pub day1_date: NaiveDate,
    pub day1_range: f64,
    pub adr3: f64,
    pub allowed: bool,
    /// Window indices 1.. in reverse chronological order; only set when denied.
    pub detail: Option<Vec<DetailRow>>,
}

struct WindowEntry<'a> {
    bar: &'a DailyBar,
    adr: Option<f64>,
}

fn validate_history(history: &[DailyBar]) -> Result<(), InsufficientData> {
    let mut prev: Option<NaiveDate> = None;
    for bar in history {
        if let Some(defect) = bar.defect() {
            return Err(InsufficientData::MalformedBar {
                date: bar.date,
                defect,
            });
        }
        if prev.is_some_and(|p| bar.date <= p) {
            return Err(InsufficientData::MalformedBar {
                date: bar.date,
                defect: BarDefect::OutOfOrder,
            });
        }
        prev = Some(bar.date);
    }
    Ok(())
}

fn trailing_window<'a>(
    history: &'a [DailyBar],
    adr: &IndicatorSeries,
    target_date: NaiveDate,
    lagging_bars: usize,
) -> Result<Vec<WindowEntry<'a>>, InsufficientData> {
    // History is strictly ascending here, so the prior bars form a prefix.
    let prior = history.partition_point(|b| b.date < target_date);
    if prior < lagging_bars {
        return Err(InsufficientData::NotEnoughPriorDays {
            target: target_date,
            available: prior,
            required: lagging_bars,
        });
    }

    Ok((prior - lagging_bars..prior)
        .rev()
        .map(|i| WindowEntry {
            bar: &history[i],
            adr: adr.value_at(i),
        })
        .collect())
}

/// Applies the ADR rule for `target_date`.
///
/// `history` must be ascending by date; bars on or after the target date are
/// ignored apart from the row-count and well-formedness checks.
pub fn decide(
    history: &[DailyBar],
    target_date: NaiveDate,
    params: &DecisionParams,
) -> Result<Decision, InsufficientData> {
    let minimum = params.min_history();
    if history.len() < minimum {
        return Err(InsufficientData::HistoryTooShort {
            bars: history.len(),
            minimum,
        });
    }

    validate_history(history)?;

    let adr = calculate_adr(history, params.window_size);
    let window = trailing_window(history, &adr, target_date, params.lagging_bars)?;

    let day1 = window[0].bar;
    let day1_range = day1.high - day1.low;

    let compare = &window[1..=params.adr_compare_bars];
    let mut sum = 0.0;
    for entry in compare {
        sum += entry.adr.ok_or(InsufficientData::AdrUndefined {
            date: entry.bar.date,
        })?;
    }
    let adr3 = sum / compare.len() as f64;

    let allowed = !(day1_range > adr3);

    let detail: Option<Vec<DetailRow>> = (!allowed).then(|| {
        window[1..]
            .iter()
            .map(|entry| DetailRow {
                date: entry.bar.date,
                high: entry.bar.high,
                low: entry.bar.low,
                adr: entry.adr,
            })
            .collect()
    });

    Ok(Decision {
        target_date,
        day1_date: day1.date,
        day1_range,
        adr3,
        allowed,
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Bars on consecutive weekdays starting at `start`, low fixed at 1000.
    fn business_bars(start: NaiveDate, ranges: &[f64]) -> Vec<DailyBar> {
        let mut bars = Vec::with_capacity(ranges.len());
        let mut d = start;
        for &r in ranges {
            while matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
                d = d.succ_opt().unwrap();
            }
            bars.push(DailyBar {
                date: d,
                open: 1000.0,
                high: 1000.0 + r,
                low: 1000.0,
                close: 1000.0 + r / 2.0,
                volume: 10_000,
            });
            d = d.succ_opt().unwrap();
        }
        bars
    }

    fn next_day(bars: &[DailyBar]) -> NaiveDate {
        bars.last().unwrap().date.succ_opt().unwrap()
    }

    #[test]
    fn params_default() {
        let p = DecisionParams::default();
        assert_eq!(p.window_size(), 14);
        assert_eq!(p.lagging_bars(), 6);
        assert_eq!(p.adr_compare_bars(), 3);
        assert_eq!(p.min_history(), 20);
    }

    #[test]
    fn params_reject_inconsistent_sizes() {
        assert_eq!(DecisionParams::new(0, 6, 3), Err(ParamsError::ZeroWindow));
        assert_eq!(DecisionParams::new(14, 6, 0), Err(ParamsError::ZeroCompare));
        assert_eq!(
            DecisionParams::new(14, 3, 3),
            Err(ParamsError::LaggingTooShort {
                lagging: 3,
                compare: 3
            })
        );
        assert!(DecisionParams::new(5, 4, 3).is_ok());
    }

    #[test]
    fn spike_on_day1_denies() {
        let mut ranges = vec![10.0; 20];
        ranges[19] = 50.0;
        let bars = business_bars(date(2024, 1, 1), &ranges);
        let target = next_day(&bars);

        let decision = decide(&bars, target, &DecisionParams::default()).unwrap();

        assert_eq!(decision.day1_range, 50.0);
        assert_eq!(decision.adr3, 10.0);
        assert!(!decision.allowed);
        assert_eq!(decision.day1_date, bars[19].date);

        let detail = decision.detail.unwrap();
        assert_eq!(detail.len(), 5);
        assert!(detail.iter().all(|r| r.adr == Some(10.0)));
        assert_eq!(detail[0].date, bars[18].date);
        assert_eq!(detail[4].date, bars[14].date);
    }

    #[test]
    fn detail_rows_strictly_descending() {
        let mut ranges = vec![10.0; 25];
        ranges[24] = 40.0;
        let bars = business_bars(date(2024, 2, 1), &ranges);
        let decision = decide(&bars, next_day(&bars), &DecisionParams::default()).unwrap();

        let detail = decision.detail.unwrap();
        assert!(detail.windows(2).all(|w| w[0].date > w[1].date));
        assert!(detail[0].date < decision.day1_date);
    }

    #[test]
    fn tie_is_allowed() {
        let bars = business_bars(date(2024, 1, 1), &[10.0; 20]);
        let decision = decide(&bars, next_day(&bars), &DecisionParams::default()).unwrap();

        assert_eq!(decision.day1_range, decision.adr3);
        assert!(decision.allowed);
        assert!(decision.detail.is_none());
    }

    #[test]
    fn one_unit_either_side_of_threshold() {
        let mut above = vec![10.0; 20];
        above[19] = 11.0;
        let bars = business_bars(date(2024, 1, 1), &above);
        assert!(
            !decide(&bars, next_day(&bars), &DecisionParams::default())
                .unwrap()
                .allowed
        );

        let mut below = vec![10.0; 20];
        below[19] = 9.0;
        let bars = business_bars(date(2024, 1, 1), &below);
        assert!(
            decide(&bars, next_day(&bars), &DecisionParams::default())
                .unwrap()
                .allowed
        );
    }

    #[test]
    fn adr3_averages_indices_one_to_three() {
        // With a period of 1 each ADR value is the bar's own range.
        let bars = business_bars(date(2024, 1, 1), &[1.0, 1.0, 40.0, 30.0, 20.0, 10.0]);
        let params = DecisionParams::new(1, 4, 3).unwrap();
        let decision = decide(&bars, next_day(&bars), &params).unwrap();

        assert_eq!(decision.day1_range, 10.0);
        assert_eq!(decision.adr3, (20.0 + 30.0 + 40.0) / 3.0);
        assert!(decision.allowed);
    }

    #[test]
    fn bars_on_and_after_target_are_ignored() {
        let mut ranges = vec![10.0; 20];
        ranges.extend([500.0, 500.0]);
        let bars = business_bars(date(2024, 1, 1), &ranges);
        let target = bars[20].date;

        let decision = decide(&bars, target, &DecisionParams::default()).unwrap();
        assert_eq!(decision.day1_date, bars[19].date);
        assert_eq!(decision.day1_range, 10.0);
        assert!(decision.allowed);
    }

    #[test]
    fn short_history_fails() {
        let bars = business_bars(date(2024, 1, 1), &[10.0; 19]);
        let err = decide(&bars, next_day(&bars), &DecisionParams::default()).unwrap_err();
        assert_eq!(
            err,
            InsufficientData::HistoryTooShort {
                bars: 19,
                minimum: 20
            }
        );
    }

    #[test]
    fn empty_history_fails() {
        let err = decide(&[], date(2024, 1, 1), &DecisionParams::default()).unwrap_err();
        assert_eq!(err.reason(), "history too short");
    }

    #[test]
    fn inverted_bar_fails() {
        let mut bars = business_bars(date(2024, 1, 1), &[10.0; 22]);
        bars[5].high = bars[5].low - 1.0;
        let err = decide(&bars, next_day(&bars), &DecisionParams::default()).unwrap_err();
        assert_eq!(
            err,
            InsufficientData::MalformedBar {
                date: bars[5].date,
                defect: BarDefect::HighBelowLow
            }
        );
    }

    #[test]
    fn duplicate_date_fails() {
        let mut bars = business_bars(date(2024, 1, 1), &[10.0; 22]);
        bars[7].date = bars[6].date;
        let err = decide(&bars, next_day(&bars), &DecisionParams::default()).unwrap_err();
        assert!(matches!(
            err,
            InsufficientData::MalformedBar {
                defect: BarDefect::OutOfOrder,
                ..
            }
        ));
    }

    #[test]
    fn target_too_early_fails() {
        let bars = business_bars(date(2024, 1, 1), &[10.0; 30]);
        let target = bars[4].date;
        let err = decide(&bars, target, &DecisionParams::default()).unwrap_err();
        assert_eq!(
            err,
            InsufficientData::NotEnoughPriorDays {
                target,
                available: 4,
                required: 6
            }
        );
    }

    #[test]
    fn undefined_adr_in_comparison_fails() {
        // 20 bars, target right after bar 15: window[3] is bar 12, ADR(14) undefined.
        let bars = business_bars(date(2024, 1, 1), &[10.0; 20]);
        let target = bars[16].date;
        let err = decide(&bars, target, &DecisionParams::default()).unwrap_err();
        assert_eq!(err, InsufficientData::AdrUndefined { date: bars[12].date });
    }

    #[test]
    fn undefined_adr_outside_comparison_is_kept_as_none() {
        // Window is bars 17..=12; ADR(14) is first defined at bar 13.
        let mut ranges = vec![10.0; 20];
        ranges[17] = 80.0;
        let bars = business_bars(date(2024, 1, 1), &ranges);
        let target = bars[18].date;

        let decision = decide(&bars, target, &DecisionParams::default()).unwrap();
        assert!(!decision.allowed);
        let detail = decision.detail.unwrap();
        assert_eq!(detail[3].adr, Some(10.0));
        assert_eq!(detail[4].adr, None);
        assert_eq!(detail[4].date, bars[12].date);
    }

    #[test]
    fn decide_is_repeatable() {
        let ranges: Vec<f64> = (0..40).map(|i| 5.0 + (i % 7) as f64 * 1.25).collect();
        let bars = business_bars(date(2023, 6, 1), &ranges);
        let target = next_day(&bars);
        let params = DecisionParams::default();

        let a = decide(&bars, target, &params).unwrap();
        let b = decide(&bars, target, &params).unwrap();
        assert_eq!(a.day1_range.to_bits(), b.day1_range.to_bits());
        assert_eq!(a.adr3.to_bits(), b.adr3.to_bits());
        assert_eq!(a, b);
    }
}
