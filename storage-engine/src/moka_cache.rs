use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use ratekeeper::domain::CurrencyCode;
use ratekeeper::ports::RateCache;
use shared::Result;
use std::fmt::Debug;
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    rate: f64,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
/// Overwriting an entry restarts its clock.
struct PerEntryTtl;

impl Expiry<String, CachedRate> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedRate,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedRate,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Moka-based rate cache with per-entry TTL
/// Provides lock-free, concurrent access bounded by entry count
#[derive(Clone)]
pub struct MokaRateCache {
    cache: Cache<String, CachedRate>,
}

impl MokaRateCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .name("rates")
            .max_capacity(max_entries)
            .expire_after(PerEntryTtl)
            .build();

        Self { cache }
    }
}

#[async_trait]
impl RateCache for MokaRateCache {
    async fn get(&self, code: &CurrencyCode) -> Result<Option<f64>> {
        // Absent and expired entries look the same
        Ok(self.cache.get(code.as_str()).await.map(|cached| cached.rate))
    }

    async fn set(&self, code: &CurrencyCode, rate: f64, ttl: Duration) -> Result<()> {
        trace!("Caching {} = {} for {:?}", code, rate, ttl);
        self.cache
            .insert(code.to_string(), CachedRate { rate, ttl })
            .await;
        Ok(())
    }

    async fn delete(&self, code: &CurrencyCode) -> Result<()> {
        self.cache.invalidate(code.as_str()).await;
        Ok(())
    }
}

impl Debug for MokaRateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaRateCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}
