//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::adapters::cached_history::{CachedHistory, DEFAULT_CACHE_TTL};
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report::TextReportAdapter;
use crate::domain::config_validation::{
    decision_params_from_config, int_setting, validate_decision_config, validate_history_config,
};
use crate::domain::error::AdrError;
use crate::domain::lookback::{HistoryLookback, LookbackKind, DEFAULT_TRAILING_DAYS};
use crate::domain::request::{evaluate, DecisionRequest, DEFAULT_INSTRUMENT};
use crate::logging::init_logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "adrgate", about = "ADR trade gate for daily index trading")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decide whether trading is allowed on a date
    Decide(DecideArgs),
    /// Show the stored data range for the instrument
    Info(SourceArgs),
    /// Load a CSV file into the SQLite store
    #[cfg(feature = "sqlite")]
    Import {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Where the history comes from. Every field overrides the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct SourceArgs {
    #[arg(long)]
    pub symbol: Option<String>,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub source: Option<HistorySource>,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct DecideArgs {
    /// Target date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
    #[arg(long)]
    pub lookback: Option<LookbackKind>,
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySource {
    Csv,
    Sqlite,
    Yahoo,
}

impl FromStr for HistorySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(HistorySource::Csv),
            "sqlite" => Ok(HistorySource::Sqlite),
            "yahoo" => Ok(HistorySource::Yahoo),
            other => Err(format!(
                "unknown history source '{}' (expected csv, sqlite or yahoo)",
                other
            )),
        }
    }
}

impl fmt::Display for HistorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistorySource::Csv => write!(f, "csv"),
            HistorySource::Sqlite => write!(f, "sqlite"),
            HistorySource::Yahoo => write!(f, "yahoo"),
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    match cli.command {
        Command::Decide(args) => run_decide(&args),
        Command::Info(args) => run_info(&args),
        #[cfg(feature = "sqlite")]
        Command::Import {
            csv,
            symbol,
            config,
        } => run_import(&csv, symbol.as_deref(), &config),
    }
}

fn fail(err: &AdrError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Loads the INI file at `path`; no path means every key takes its default.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, AdrError> {
    match path {
        None => Ok(FileConfigAdapter::empty()),
        Some(p) => {
            debug!(path = %p.display(), "loading config");
            FileConfigAdapter::from_file(p).map_err(|e| AdrError::ConfigParse {
                file: p.display().to_string(),
                reason: e.to_string(),
            })
        }
    }
}

pub fn resolve_symbol(symbol: Option<&str>, config: &dyn ConfigPort) -> String {
    symbol
        .map(str::to_string)
        .or_else(|| config.get_string("instrument", "symbol"))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| DEFAULT_INSTRUMENT.to_string())
}

pub fn resolve_source(
    source: Option<HistorySource>,
    config: &dyn ConfigPort,
) -> Result<HistorySource, AdrError> {
    if let Some(s) = source {
        return Ok(s);
    }
    match config.get_string("history", "source") {
        None => Ok(HistorySource::Csv),
        Some(s) => s.parse().map_err(|reason| AdrError::ConfigInvalid {
            section: "history".into(),
            key: "source".into(),
            reason,
        }),
    }
}

pub fn resolve_data_dir(data_dir: Option<&Path>, config: &dyn ConfigPort) -> PathBuf {
    data_dir
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("history", "data_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

pub fn build_lookback(
    kind: Option<LookbackKind>,
    config: &dyn ConfigPort,
) -> Result<HistoryLookback, AdrError> {
    let kind = match kind {
        Some(k) => k,
        None => match config.get_string("history", "lookback") {
            None => LookbackKind::Full,
            Some(s) => s.parse().map_err(|reason| AdrError::ConfigInvalid {
                section: "history".into(),
                key: "lookback".into(),
                reason,
            })?,
        },
    };

    Ok(match kind {
        LookbackKind::Full => match config.get_date("history", "start_date") {
            Some(start) => HistoryLookback::Full { start },
            None => HistoryLookback::default_full(),
        },
        LookbackKind::Trailing => {
            let days = int_setting(
                config,
                "history",
                "trailing_days",
                i64::from(DEFAULT_TRAILING_DAYS),
            )?;
            let calendar_days = u32::try_from(days)
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| AdrError::ConfigInvalid {
                    section: "history".into(),
                    key: "trailing_days".into(),
                    reason: format!("trailing_days must be a positive day count, got {}", days),
                })?;
            HistoryLookback::Trailing { calendar_days }
        }
    })
}

/// Builds the request from flags, then config, then defaults.
pub fn build_request(
    config: &dyn ConfigPort,
    args: &DecideArgs,
    today: NaiveDate,
) -> Result<DecisionRequest, AdrError> {
    validate_history_config(config)?;
    validate_decision_config(config)?;

    Ok(DecisionRequest {
        instrument: resolve_symbol(args.source.symbol.as_deref(), config),
        target_date: args.date.unwrap_or(today),
        lookback: build_lookback(args.lookback, config)?,
        params: decision_params_from_config(config)?,
    })
}

/// Opens the configured history source, wrapped in the fetch cache unless
/// `[history] cache` is off or the TTL is zero.
pub fn open_history(
    config: &dyn ConfigPort,
    source: HistorySource,
    data_dir: &Path,
) -> Result<Box<dyn HistoryPort>, AdrError> {
    info!(%source, "opening history source");
    let port: Box<dyn HistoryPort> = match source {
        HistorySource::Csv => Box::new(CsvAdapter::new(data_dir.to_path_buf())),
        HistorySource::Sqlite => open_sqlite(config)?,
        HistorySource::Yahoo => open_yahoo(config)?,
    };

    let ttl_secs = int_setting(
        config,
        "history",
        "cache_ttl_secs",
        DEFAULT_CACHE_TTL.as_secs() as i64,
    )?;
    if !config.get_bool("history", "cache", true) || ttl_secs <= 0 {
        return Ok(port);
    }
    Ok(Box::new(CachedHistory::new(
        port,
        Duration::from_secs(ttl_secs as u64),
    )))
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &dyn ConfigPort) -> Result<Box<dyn HistoryPort>, AdrError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    Ok(Box::new(SqliteAdapter::from_config(config)?))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &dyn ConfigPort) -> Result<Box<dyn HistoryPort>, AdrError> {
    Err(AdrError::ConfigInvalid {
        section: "history".into(),
        key: "source".into(),
        reason: "sqlite feature is required for source = sqlite".into(),
    })
}

#[cfg(feature = "yahoo")]
fn open_yahoo(config: &dyn ConfigPort) -> Result<Box<dyn HistoryPort>, AdrError> {
    use crate::adapters::yahoo_adapter::YahooAdapter;
    let timeout = int_setting(config, "yahoo", "timeout_secs", 30)?.max(1) as u64;
    Ok(Box::new(YahooAdapter::new(Duration::from_secs(timeout))?))
}

#[cfg(not(feature = "yahoo"))]
fn open_yahoo(_config: &dyn ConfigPort) -> Result<Box<dyn HistoryPort>, AdrError> {
    Err(AdrError::ConfigInvalid {
        section: "history".into(),
        key: "source".into(),
        reason: "yahoo feature is required for source = yahoo".into(),
    })
}

/// Evaluates `request` and renders the outcome to `out`.
///
/// A decision (allowed or not) exits 0. Insufficient data is rendered as a
/// warning and exits 5; every other failure is reported on stderr.
pub fn run_decision_pipeline(
    history_port: &dyn HistoryPort,
    request: &DecisionRequest,
    report: &dyn ReportPort,
    out: &mut dyn Write,
) -> ExitCode {
    let written = match evaluate(history_port, request) {
        Ok(decision) => report
            .write_decision(&request.instrument, &decision, out)
            .map(|_| ExitCode::SUCCESS),
        Err(AdrError::InsufficientData(reason)) => {
            info!(%reason, "no decision for {}", request.target_date);
            report
                .write_warning(&request.instrument, request.target_date, &reason, out)
                .map(|_| ExitCode::from(&AdrError::InsufficientData(reason)))
        }
        Err(e) => return fail(&e),
    };

    written.unwrap_or_else(|e| fail(&AdrError::Io(e)))
}

fn run_decide(args: &DecideArgs) -> ExitCode {
    let config = match load_config(args.source.config.as_deref()) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    let today = chrono::Local::now().date_naive();
    let request = match build_request(&config, args, today) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let port = match resolve_source(args.source.source, &config).and_then(|source| {
        let data_dir = resolve_data_dir(args.source.data_dir.as_deref(), &config);
        open_history(&config, source, &data_dir)
    }) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_decision_pipeline(port.as_ref(), &request, &TextReportAdapter, &mut out)
}

/// Writes `<symbol>: <count> bars, <first> to <last>`.
pub fn write_info(
    history_port: &dyn HistoryPort,
    symbol: &str,
    out: &mut dyn Write,
) -> Result<(), AdrError> {
    match history_port.get_data_range(symbol)? {
        Some((first, last, count)) => {
            writeln!(out, "{}: {} bars, {} to {}", symbol, count, first, last)?;
            Ok(())
        }
        None => Err(AdrError::unavailable(symbol, "no data found")),
    }
}

fn run_info(args: &SourceArgs) -> ExitCode {
    let result = load_config(args.config.as_deref()).and_then(|config| {
        let symbol = resolve_symbol(args.symbol.as_deref(), &config);
        let source = resolve_source(args.source, &config)?;
        let data_dir = resolve_data_dir(args.data_dir.as_deref(), &config);
        let port = open_history(&config, source, &data_dir)?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_info(port.as_ref(), &symbol, &mut out)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

/// Reads `csv_path` and upserts its bars under `symbol`.
#[cfg(feature = "sqlite")]
pub fn import_csv(
    store: &crate::adapters::sqlite_adapter::SqliteAdapter,
    csv_path: &Path,
    symbol: &str,
) -> Result<usize, AdrError> {
    let bars = CsvAdapter::read_file(csv_path, symbol)?;
    info!(symbol, bars = bars.len(), path = %csv_path.display(), "importing CSV");
    store.insert_bars(symbol, &bars)
}

#[cfg(feature = "sqlite")]
fn run_import(csv_path: &Path, symbol: Option<&str>, config_path: &Path) -> ExitCode {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let result = load_config(Some(config_path)).and_then(|config| {
        let symbol = resolve_symbol(symbol, &config);
        let store = SqliteAdapter::from_config(&config)?;
        let count = import_csv(&store, csv_path, &symbol)?;
        Ok((symbol, count))
    });

    match result {
        Ok((symbol, count)) => {
            eprintln!("Imported {} bars for {}", count, symbol);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decide_with_flags() {
        let cli = Cli::try_parse_from([
            "adrgate",
            "-vv",
            "decide",
            "--date",
            "2024-03-04",
            "--symbol",
            "QQQ",
            "--source",
            "csv",
            "--lookback",
            "trailing",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Decide(args) => {
                assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 3, 4));
                assert_eq!(args.source.symbol.as_deref(), Some("QQQ"));
                assert_eq!(args.source.source, Some(HistorySource::Csv));
                assert_eq!(args.lookback, Some(LookbackKind::Trailing));
            }
            other => panic!("expected decide, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_source_flag() {
        let result = Cli::try_parse_from(["adrgate", "decide", "--source", "bloomberg"]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_bad_date_flag() {
        let result = Cli::try_parse_from(["adrgate", "decide", "--date", "04/03/2024"]);
        assert!(result.is_err());
    }

    #[test]
    fn history_source_round_trips_display() {
        for s in ["csv", "sqlite", "yahoo"] {
            assert_eq!(s.parse::<HistorySource>().unwrap().to_string(), s);
        }
    }
}
