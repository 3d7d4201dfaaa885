//! Daily range: RANGE[i] = H[i] - L[i]. Defined for every bar.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::DailyBar;

pub fn calculate_range(bars: &[DailyBar]) -> IndicatorSeries {
    let values = bars
        .iter()
        .map(|bar| IndicatorPoint {
            date: bar.date,
            value: Some(bar.range()),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Range,
        values,
    }
}
