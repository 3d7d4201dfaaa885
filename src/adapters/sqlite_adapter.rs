//! SQLite history store.

use crate::domain::config_validation::int_setting;
use crate::domain::error::AdrError;
use crate::domain::ohlcv::DailyBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::{debug, info};

/// Label used in errors that are not tied to one instrument.
const STORE: &str = "sqlite";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn store_error(instrument: &str, e: impl std::fmt::Display) -> AdrError {
    AdrError::unavailable(instrument, e.to_string())
}

fn parse_date(instrument: &str, s: &str) -> Result<NaiveDate, AdrError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| store_error(instrument, e))
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AdrError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| AdrError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = int_setting(config, "sqlite", "pool_size", 4)?.max(1) as u32;

        info!(path = %db_path, pool_size, "opening SQLite store");
        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e| store_error(STORE, e))?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, AdrError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| store_error(STORE, e))?;

        Ok(Self { pool })
    }

    fn conn(&self, instrument: &str) -> Result<PooledConnection<SqliteConnectionManager>, AdrError> {
        self.pool.get().map_err(|e| store_error(instrument, e))
    }

    pub fn initialize_schema(&self) -> Result<(), AdrError> {
        let conn = self.conn(STORE)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS daily_bar (
                instrument TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (instrument, date)
            );
            CREATE INDEX IF NOT EXISTS idx_daily_bar_date ON daily_bar(date);",
        )
        .map_err(|e| store_error(STORE, e))?;

        Ok(())
    }

    /// Upserts `bars` for `instrument` in one transaction.
    pub fn insert_bars(&self, instrument: &str, bars: &[DailyBar]) -> Result<usize, AdrError> {
        let mut conn = self.conn(instrument)?;
        let tx = conn.transaction().map_err(|e| store_error(instrument, e))?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO daily_bar (instrument, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    instrument,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(|e| store_error(instrument, e))?;
        }

        tx.commit().map_err(|e| store_error(instrument, e))?;
        debug!(instrument, rows = bars.len(), "bars stored");
        Ok(bars.len())
    }

    fn query_bars(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, AdrError> {
        let conn = self.conn(instrument)?;

        let start_str = start.format("%Y-%m-%d").to_string();
        let end_str = end.format("%Y-%m-%d").to_string();

        let query = "SELECT date, open, high, low, close, volume
                     FROM daily_bar
                     WHERE instrument = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date ASC";

        let mut stmt = conn.prepare(query).map_err(|e| store_error(instrument, e))?;

        let rows = stmt
            .query_map(params![instrument, start_str, end_str], |row| {
                let date_str: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(DailyBar {
                    date,
                    open: row.get(1)?,
                    high: row.get(2)?,
                    low: row.get(3)?,
                    close: row.get(4)?,
                    volume: row.get(5)?,
                })
            })
            .map_err(|e| store_error(instrument, e))?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row.map_err(|e| store_error(instrument, e))?);
        }

        Ok(bars)
    }
}

impl HistoryPort for SqliteAdapter {
    fn fetch_daily_history(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, AdrError> {
        let bars = self.query_bars(instrument, start, end)?;

        // The pool may hold a single connection, so the lookup runs after the
        // query's connection has been returned.
        if bars.is_empty() && self.get_data_range(instrument)?.is_none() {
            return Err(store_error(instrument, "instrument not found in store"));
        }

        Ok(bars)
    }

    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AdrError> {
        let conn = self.conn(instrument)?;

        let query = "SELECT MIN(date), MAX(date), COUNT(*) FROM daily_bar WHERE instrument = ?1";

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(query, params![instrument], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(|e| store_error(instrument, e))?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let min = parse_date(instrument, &min_str)?;
                let max = parse_date(instrument, &max_str)?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }
}
