//! Configuration validation.
//!
//! Every key is optional; present keys must hold sensible values.

use crate::domain::decision::{
    DecisionParams, ParamsError, DEFAULT_ADR_COMPARE_BARS, DEFAULT_LAGGING_BARS,
    DEFAULT_WINDOW_SIZE,
};
use crate::domain::error::AdrError;
use crate::domain::lookback::LookbackKind;
use crate::ports::config_port::ConfigPort;

pub const HISTORY_SOURCES: [&str; 3] = ["csv", "sqlite", "yahoo"];

pub fn validate_history_config(config: &dyn ConfigPort) -> Result<(), AdrError> {
    validate_source(config)?;
    validate_lookback(config)?;
    validate_start_date(config)?;
    validate_positive(config, "history", "trailing_days", 45)?;
    validate_non_negative(config, "history", "cache_ttl_secs")?;
    Ok(())
}

pub fn validate_decision_config(config: &dyn ConfigPort) -> Result<(), AdrError> {
    validate_positive(config, "decision", "window_size", DEFAULT_WINDOW_SIZE as i64)?;
    validate_positive(config, "decision", "lagging_bars", DEFAULT_LAGGING_BARS as i64)?;
    validate_positive(
        config,
        "decision",
        "adr_compare_bars",
        DEFAULT_ADR_COMPARE_BARS as i64,
    )?;
    decision_params_from_config(config).map(|_| ())
}

/// Integer at `[section] key`, or `default` when the key is absent. A present
/// value that does not parse is an error, never the default.
pub fn int_setting(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, AdrError> {
    config
        .try_get_int(section, key)
        .map(|v| v.unwrap_or(default))
        .map_err(|reason| AdrError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason,
        })
}

/// Config key a parameter error belongs to.
fn params_error_key(err: &ParamsError) -> &'static str {
    match err {
        ParamsError::ZeroWindow => "window_size",
        ParamsError::ZeroCompare => "adr_compare_bars",
        ParamsError::LaggingTooShort { .. } => "lagging_bars",
    }
}

/// Builds the rule parameters from `[decision]`, falling back to defaults.
pub fn decision_params_from_config(config: &dyn ConfigPort) -> Result<DecisionParams, AdrError> {
    let read = |key: &str, default: usize| -> Result<usize, AdrError> {
        let v = int_setting(config, "decision", key, default as i64)?;
        usize::try_from(v).map_err(|_| AdrError::ConfigInvalid {
            section: "decision".to_string(),
            key: key.to_string(),
            reason: format!("{} must be non-negative", key),
        })
    };

    DecisionParams::new(
        read("window_size", DEFAULT_WINDOW_SIZE)?,
        read("lagging_bars", DEFAULT_LAGGING_BARS)?,
        read("adr_compare_bars", DEFAULT_ADR_COMPARE_BARS)?,
    )
    .map_err(|e| AdrError::ConfigInvalid {
        section: "decision".to_string(),
        key: params_error_key(&e).to_string(),
        reason: e.to_string(),
    })
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), AdrError> {
    match config.get_string("history", "source") {
        None => Ok(()),
        Some(s) if HISTORY_SOURCES.contains(&s.trim().to_lowercase().as_str()) => Ok(()),
        Some(s) => Err(AdrError::ConfigInvalid {
            section: "history".to_string(),
            key: "source".to_string(),
            reason: format!(
                "unknown source '{}' (expected one of {})",
                s,
                HISTORY_SOURCES.join(", ")
            ),
        }),
    }
}

fn validate_lookback(config: &dyn ConfigPort) -> Result<(), AdrError> {
    match config.get_string("history", "lookback") {
        None => Ok(()),
        Some(s) => s
            .parse::<LookbackKind>()
            .map(|_| ())
            .map_err(|reason| AdrError::ConfigInvalid {
                section: "history".to_string(),
                key: "lookback".to_string(),
                reason,
            }),
    }
}

fn validate_start_date(config: &dyn ConfigPort) -> Result<(), AdrError> {
    if config.get_string("history", "start_date").is_some()
        && config.get_date("history", "start_date").is_none()
    {
        return Err(AdrError::ConfigInvalid {
            section: "history".to_string(),
            key: "start_date".to_string(),
            reason: "invalid start_date format, expected YYYY-MM-DD".to_string(),
        });
    }
    Ok(())
}

fn validate_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<(), AdrError> {
    let value = int_setting(config, section, key, default)?;
    if value < 1 {
        return Err(AdrError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must be at least 1", key),
        });
    }
    Ok(())
}

fn validate_non_negative(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), AdrError> {
    let value = int_setting(config, section, key, 0)?;
    if value < 0 {
        return Err(AdrError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must be non-negative", key),
        });
    }
    Ok(())
}
