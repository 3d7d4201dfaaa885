//! Time-bounded memoization of history fetches.
//!
//! Wraps any [`HistoryPort`] and reuses a fetched history for the same
//! `(instrument, start, end)` while it is younger than the TTL. Only
//! successful fetches are stored.

use crate::domain::error::AdrError;
use crate::domain::ohlcv::DailyBar;
use crate::ports::history_port::HistoryPort;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

type CacheKey = (String, NaiveDate, NaiveDate);

struct CacheEntry {
    fetched_at: Instant,
    bars: Vec<DailyBar>,
}

pub struct CachedHistory<P> {
    inner: P,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl<P: HistoryPort> CachedHistory<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of stored fetches, expired ones included until the next insert.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every stored fetch.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<Vec<DailyBar>> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => Some(entry.bars.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}

impl<P: HistoryPort> HistoryPort for CachedHistory<P> {
    fn fetch_daily_history(
        &self,
        instrument: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyBar>, AdrError> {
        let key = (instrument.to_string(), start, end);
        if let Some(bars) = self.lookup(&key) {
            debug!(instrument, %start, %end, "history cache hit");
            return Ok(bars);
        }

        debug!(instrument, %start, %end, "history cache miss");
        let bars = self.inner.fetch_daily_history(instrument, start, end)?;
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.fetched_at.elapsed() < ttl);
            entries.insert(
                key,
                CacheEntry {
                    fetched_at: Instant::now(),
                    bars: bars.clone(),
                },
            );
        }
        Ok(bars)
    }

    fn get_data_range(
        &self,
        instrument: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AdrError> {
        self.inner.get_data_range(instrument)
    }
}
