//! Domain error types.
//!
//! Provider-side failures ([`AdrError::DataUnavailable`]) and engine-side
//! failures ([`InsufficientData`]) are kept as distinct kinds: the first means
//! "try another instrument or connection", the second "try another date".

use chrono::NaiveDate;
use std::fmt;

/// Why a single bar was rejected by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarDefect {
    HighBelowLow,
    NonFinite,
    OutOfOrder,
}

impl fmt::Display for BarDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarDefect::HighBelowLow => write!(f, "high is below low"),
            BarDefect::NonFinite => write!(f, "high or low is not a finite number"),
            BarDefect::OutOfOrder => write!(f, "date is not after the previous bar"),
        }
    }
}

/// Engine-side failure: the history cannot support a decision for the date.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InsufficientData {
    #[error("history too short: have {bars} bars, need {minimum}")]
    HistoryTooShort { bars: usize, minimum: usize },

    #[error("malformed bar on {date}: {defect}")]
    MalformedBar { date: NaiveDate, defect: BarDefect },

    #[error("not enough prior trading days before {target}: have {available}, need {required}")]
    NotEnoughPriorDays {
        target: NaiveDate,
        available: usize,
        required: usize,
    },

    #[error("ADR undefined in comparison window (no full average on {date})")]
    AdrUndefined { date: NaiveDate },
}

impl InsufficientData {
    /// Short, stable phrase naming the kind of insufficiency.
    pub fn reason(&self) -> &'static str {
        match self {
            InsufficientData::HistoryTooShort { .. } => "history too short",
            InsufficientData::MalformedBar { .. } => "malformed bar",
            InsufficientData::NotEnoughPriorDays { .. } => "not enough prior trading days",
            InsufficientData::AdrUndefined { .. } => "ADR undefined in comparison window",
        }
    }
}

/// Top-level error type for adrgate.
#[derive(Debug, thiserror::Error)]
pub enum AdrError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data unavailable for {instrument}: {reason}")]
    DataUnavailable { instrument: String, reason: String },

    #[error(transparent)]
    InsufficientData(#[from] InsufficientData),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AdrError {
    pub fn unavailable(instrument: &str, reason: impl Into<String>) -> Self {
        AdrError::DataUnavailable {
            instrument: instrument.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&AdrError> for std::process::ExitCode {
    fn from(err: &AdrError) -> Self {
        let code: u8 = match err {
            AdrError::Io(_) => 1,
            AdrError::ConfigParse { .. }
            | AdrError::ConfigMissing { .. }
            | AdrError::ConfigInvalid { .. } => 2,
            AdrError::DataUnavailable { .. } => 3,
            AdrError::InsufficientData(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
