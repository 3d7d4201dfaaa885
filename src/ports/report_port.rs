//! Decision rendering port.

use crate::domain::decision::Decision;
use crate::domain::error::InsufficientData;
use chrono::NaiveDate;
use std::io::{self, Write};

/// Port for presenting a decision (or why there is none) to the user.
pub trait ReportPort {
    fn write_decision(
        &self,
        instrument: &str,
        decision: &Decision,
        out: &mut dyn Write,
    ) -> io::Result<()>;

    fn write_warning(
        &self,
        instrument: &str,
        target_date: NaiveDate,
        reason: &InsufficientData,
        out: &mut dyn Write,
    ) -> io::Result<()>;
}
