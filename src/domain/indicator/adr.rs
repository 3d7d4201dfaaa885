//! Average Daily Range.
//!
//! Trailing simple moving average of the daily range over n bars.
//! ADR(n)[i] = sum(H[i-j] - L[i-j] for j in 0..n) / n
//! Warmup: first (n-1) bars are undefined. The window is never partial.
//!
//! Each value is summed from its own window rather than from a running total,
//! so ADR[i] depends on nothing outside bars i-n+1..=i.

use crate::domain::indicator::range::calculate_range;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::DailyBar;

pub fn calculate_adr(bars: &[DailyBar], period: usize) -> IndicatorSeries {
    let ranges: Vec<f64> = calculate_range(bars)
        .values
        .iter()
        .map(|p| p.value.unwrap_or(f64::NAN))
        .collect();
    let mut values = Vec::with_capacity(bars.len());
    let warmup = period.saturating_sub(1);

    for (i, bar) in bars.iter().enumerate() {
        let value = if period > 0 && i >= warmup {
            let window = &ranges[i + 1 - period..=i];
            Some(window.iter().sum::<f64>() / period as f64)
        } else {
            None
        };

        values.push(IndicatorPoint {
            date: bar.date,
            value,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Adr(period),
        values,
    }
}
