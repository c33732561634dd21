//! In-memory port implementations for unit tests

use crate::domain::{CurrencyCode, CurrencyRate, ExchangeRateSnapshot};
use crate::feed::{FeedError, FeedFailure};
use crate::ports::{CurrencyStore, RateCache, RateFeed};
use async_trait::async_trait;
use shared::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub fn code(raw: &str) -> CurrencyCode {
    CurrencyCode::parse(raw).unwrap()
}

pub fn snapshot(pairs: &[(&str, f64)]) -> ExchangeRateSnapshot {
    ExchangeRateSnapshot {
        timestamp: 1_700_000_000,
        base: "USD".to_string(),
        rates: pairs.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
    }
}

#[derive(Default)]
pub struct MemoryCurrencyStore {
    rows: Mutex<HashMap<CurrencyCode, CurrencyRate>>,
    failing: Mutex<HashSet<CurrencyCode>>,
    pub reads: AtomicUsize,
}

impl MemoryCurrencyStore {
    pub fn with_rates(pairs: &[(&str, f64)]) -> Self {
        let store = Self::default();
        {
            let mut rows = store.rows.lock().unwrap();
            for (raw, rate) in pairs {
                let row = CurrencyRate::new(code(raw), *rate, "seed").unwrap();
                rows.insert(row.code.clone(), row);
            }
        }
        store
    }

    pub fn insert(&self, row: CurrencyRate) {
        self.rows.lock().unwrap().insert(row.code.clone(), row);
    }

    pub fn row(&self, raw: &str) -> Option<CurrencyRate> {
        self.rows.lock().unwrap().get(&code(raw)).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Every write for `raw` fails with a storage error
    pub fn fail_writes_for(&self, raw: &str) {
        self.failing.lock().unwrap().insert(code(raw));
    }

    fn check_writable(&self, code: &CurrencyCode) -> Result<()> {
        if self.failing.lock().unwrap().contains(code) {
            return Err(Error::Storage(format!("write to {} refused", code)));
        }
        Ok(())
    }
}

#[async_trait]
impl CurrencyStore for MemoryCurrencyStore {
    async fn get_by_code(&self, code: &CurrencyCode) -> Result<Option<CurrencyRate>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().unwrap().get(code).cloned())
    }

    async fn create(&self, rate: CurrencyRate) -> Result<()> {
        self.check_writable(&rate.code)?;
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&rate.code) {
            return Err(Error::AlreadyExists(rate.code.to_string()));
        }
        rows.insert(rate.code.clone(), rate);
        Ok(())
    }

    async fn update(&self, rate: CurrencyRate) -> Result<()> {
        self.check_writable(&rate.code)?;
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&rate.code) {
            Some(existing) => {
                existing.rate = rate.rate;
                existing.updated_at = rate.updated_at.max(existing.updated_at);
                existing.updated_by = rate.updated_by;
                Ok(())
            }
            None => Err(Error::CurrencyNotFound(rate.code.to_string())),
        }
    }

    async fn delete(&self, code: &CurrencyCode) -> Result<()> {
        self.check_writable(code)?;
        match self.rows.lock().unwrap().remove(code) {
            Some(_) => Ok(()),
            None => Err(Error::CurrencyNotFound(code.to_string())),
        }
    }
}

#[derive(Default)]
pub struct MemoryRateCache {
    entries: Mutex<HashMap<CurrencyCode, (f64, Duration)>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl MemoryRateCache {
    pub fn entry(&self, raw: &str) -> Option<(f64, Duration)> {
        self.entries.lock().unwrap().get(&code(raw)).copied()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl RateCache for MemoryRateCache {
    async fn get(&self, code: &CurrencyCode) -> Result<Option<f64>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Cache("read refused".to_string()));
        }
        Ok(self.entries.lock().unwrap().get(code).map(|(rate, _)| *rate))
    }

    async fn set(&self, code: &CurrencyCode, rate: f64, ttl: Duration) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Cache("write refused".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .insert(code.clone(), (rate, ttl));
        Ok(())
    }

    async fn delete(&self, code: &CurrencyCode) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Cache("delete refused".to_string()));
        }
        self.entries.lock().unwrap().remove(code);
        Ok(())
    }
}

/// Replays scripted responses, repeating the last one once the script runs out
pub struct StubFeed {
    responses: Vec<std::result::Result<ExchangeRateSnapshot, FeedError>>,
    pub calls: AtomicUsize,
}

impl StubFeed {
    pub fn new(responses: Vec<std::result::Result<ExchangeRateSnapshot, FeedError>>) -> Self {
        Self {
            responses,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateFeed for StubFeed {
    async fn fetch_rates(
        &self,
        _cancel: &CancellationToken,
    ) -> std::result::Result<ExchangeRateSnapshot, FeedError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.responses.len().saturating_sub(1));
        self.responses.get(index).cloned().unwrap_or(Err(FeedError::Unavailable {
            attempts: 1,
            last: FeedFailure::Status(503),
        }))
    }
}
