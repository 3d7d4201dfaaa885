//! Plain-text rendering of a trade decision.

use crate::domain::decision::{Decision, DetailRow};
use crate::domain::error::InsufficientData;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDate;
use std::io::{self, Write};

pub struct TextReportAdapter;

/// Two decimals, or `N/A` where the value is undefined.
pub fn format_amount(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => "N/A".to_string(),
    }
}

fn write_detail_table(rows: &[DetailRow], out: &mut dyn Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{:<10} | {:>10} | {:>10} | {:>8}", "Day", "High", "Low", "ADR")?;
    writeln!(out, "{}", "-".repeat(47))?;
    for row in rows {
        writeln!(
            out,
            "{:<10} | {:>10} | {:>10} | {:>8}",
            row.date.format("%Y-%m-%d"),
            format_amount(Some(row.high)),
            format_amount(Some(row.low)),
            format_amount(row.adr)
        )?;
    }
    Ok(())
}

impl ReportPort for TextReportAdapter {
    fn write_decision(
        &self,
        instrument: &str,
        decision: &Decision,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        writeln!(
            out,
            "ADR trade check: {} on {}",
            instrument,
            decision.target_date.format("%Y-%m-%d")
        )?;
        writeln!(
            out,
            "Yesterday's Range (Day 1): {}",
            format_amount(Some(decision.day1_range))
        )?;
        writeln!(
            out,
            "3-Day ADR (Day 2-4): {}",
            format_amount(Some(decision.adr3))
        )?;
        writeln!(out)?;

        if decision.allowed {
            writeln!(out, "TRADE ALLOWED")?;
        } else {
            writeln!(out, "NO TRADE")?;
        }

        if let Some(rows) = &decision.detail {
            write_detail_table(rows, out)?;
        }
        Ok(())
    }

    fn write_warning(
        &self,
        instrument: &str,
        target_date: NaiveDate,
        reason: &InsufficientData,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        writeln!(
            out,
            "ADR trade check: {} on {}",
            instrument,
            target_date.format("%Y-%m-%d")
        )?;
        writeln!(
            out,
            "warning: {}. Please try a different date.",
            reason.reason()
        )
    }
}
