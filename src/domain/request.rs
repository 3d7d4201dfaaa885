//! One decision request: fetch the history, then apply the rule.

use crate::domain::decision::{decide, Decision, DecisionParams};
use crate::domain::error::AdrError;
use crate::domain::lookback::HistoryLookback;
use crate::ports::history_port::HistoryPort;
use chrono::NaiveDate;
use tracing::{debug, info};

pub const DEFAULT_INSTRUMENT: &str = "^NDX";

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRequest {
    pub instrument: String,
    pub target_date: NaiveDate,
    pub lookback: HistoryLookback,
    pub params: DecisionParams,
}

impl DecisionRequest {
    pub fn new(instrument: impl Into<String>, target_date: NaiveDate) -> Self {
        Self {
            instrument: instrument.into(),
            target_date,
            lookback: HistoryLookback::default(),
            params: DecisionParams::default(),
        }
    }
}

/// Provider failures come back as [`AdrError::DataUnavailable`], engine
/// failures as [`AdrError::InsufficientData`].
pub fn evaluate(
    history_port: &dyn HistoryPort,
    request: &DecisionRequest,
) -> Result<Decision, AdrError> {
    let (start, end) = request.lookback.fetch_range(request.target_date);
    info!(
        instrument = %request.instrument,
        target = %request.target_date,
        lookback = %request.lookback,
        "fetching daily history {} to {}",
        start,
        end
    );

    let history = history_port.fetch_daily_history(&request.instrument, start, end)?;
    debug!(bars = history.len(), "history loaded");

    let decision = decide(&history, request.target_date, &request.params)?;
    info!(
        day1_range = decision.day1_range,
        adr3 = decision.adr3,
        allowed = decision.allowed,
        "decision computed"
    );
    Ok(decision)
}
