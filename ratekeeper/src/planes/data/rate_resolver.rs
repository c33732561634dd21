use crate::domain::CurrencyCode;
use crate::planes::data::operation::RateOperations;
use crate::ports::{CurrencyStore, RateCache};
use async_trait::async_trait;
use shared::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache-aside rate lookup. Never talks to the rate feed.
#[derive(Clone)]
pub struct RateResolver {
    store: Arc<dyn CurrencyStore>,
    cache: Arc<dyn RateCache>,
    ttl: Duration,
}

impl RateResolver {
    pub fn new(store: Arc<dyn CurrencyStore>, cache: Arc<dyn RateCache>, ttl: Duration) -> Self {
        Self { store, cache, ttl }
    }
}

impl std::fmt::Debug for RateResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateResolver")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[async_trait]
impl RateOperations for RateResolver {
    async fn resolve(&self, code: &CurrencyCode) -> Result<f64> {
        match self.cache.get(code).await {
            Ok(Some(rate)) => {
                debug!("Cache hit for {}", code);
                return Ok(rate);
            }
            Ok(None) => debug!("Cache miss for {}", code),
            Err(e) => warn!("Cache read failed for {}, falling back to store: {}", code, e),
        }

        let row = self
            .store
            .get_by_code(code)
            .await?
            .ok_or_else(|| Error::CurrencyNotFound(code.to_string()))?;

        if let Err(e) = self.cache.set(code, row.rate, self.ttl).await {
            warn!("Failed to cache rate for {}: {}", code, e);
        }

        Ok(row.rate)
    }

    async fn convert(&self, from: &CurrencyCode, to: &CurrencyCode, amount: f64) -> Result<f64> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidAmount(amount));
        }

        let from_rate = self.resolve(from).await?;
        let to_rate = self.resolve(to).await?;

        Ok(amount / from_rate * to_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{code, MemoryCurrencyStore, MemoryRateCache};
    use std::sync::atomic::Ordering;

    const TTL: Duration = Duration::from_secs(3600);

    fn resolver_with(
        pairs: &[(&str, f64)],
    ) -> (RateResolver, Arc<MemoryCurrencyStore>, Arc<MemoryRateCache>) {
        let store = Arc::new(MemoryCurrencyStore::with_rates(pairs));
        let cache = Arc::new(MemoryRateCache::default());
        let resolver = RateResolver::new(store.clone(), cache.clone(), TTL);
        (resolver, store, cache)
    }

    #[tokio::test]
    async fn test_resolve_miss_populates_cache() {
        let (resolver, store, cache) = resolver_with(&[("EUR", 0.85)]);

        let rate = resolver.resolve(&code("EUR")).await.unwrap();

        assert_eq!(rate, 0.85);
        assert_eq!(cache.entry("EUR"), Some((0.85, TTL)));
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_hit_skips_store() {
        let (resolver, store, _cache) = resolver_with(&[("EUR", 0.85)]);

        resolver.resolve(&code("EUR")).await.unwrap();
        resolver.resolve(&code("EUR")).await.unwrap();

        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_after_cache_clear_returns_store_value() {
        let (resolver, store, cache) = resolver_with(&[("GBP", 0.75)]);
        resolver.resolve(&code("GBP")).await.unwrap();

        let mut row = store.row("GBP").unwrap();
        row.rate = 0.79;
        store.insert(row);
        cache.clear();

        assert_eq!(resolver.resolve(&code("GBP")).await.unwrap(), 0.79);
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let (resolver, store, cache) = resolver_with(&[("EUR", 0.85)]);

        let result = resolver.resolve(&code("XYZ")).await;

        assert!(matches!(result, Err(Error::CurrencyNotFound(c)) if c == "XYZ"));
        assert_eq!(cache.len(), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_treats_cache_errors_as_miss() {
        let (resolver, _store, cache) = resolver_with(&[("EUR", 0.85)]);
        cache.fail_reads.store(true, Ordering::SeqCst);
        cache.fail_writes.store(true, Ordering::SeqCst);

        assert_eq!(resolver.resolve(&code("EUR")).await.unwrap(), 0.85);
    }

    #[tokio::test]
    async fn test_convert_through_base_currency() {
        let (resolver, _store, _cache) =
            resolver_with(&[("USD", 1.0), ("EUR", 0.85), ("GBP", 0.75)]);

        let usd_to_eur = resolver
            .convert(&code("USD"), &code("EUR"), 100.0)
            .await
            .unwrap();
        let eur_to_gbp = resolver
            .convert(&code("EUR"), &code("GBP"), 100.0)
            .await
            .unwrap();

        assert!((usd_to_eur - 85.0).abs() < 0.001);
        assert!((eur_to_gbp - 88.24).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_convert_rejects_bad_amount() {
        let (resolver, store, _cache) = resolver_with(&[("USD", 1.0)]);

        for amount in [-1.0, f64::NAN, f64::INFINITY] {
            let result = resolver.convert(&code("USD"), &code("USD"), amount).await;
            assert!(matches!(result, Err(Error::InvalidAmount(_))));
        }
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_convert_unknown_target() {
        let (resolver, _store, _cache) = resolver_with(&[("USD", 1.0)]);

        let result = resolver.convert(&code("USD"), &code("JPY"), 10.0).await;

        assert!(matches!(result, Err(Error::CurrencyNotFound(c)) if c == "JPY"));
    }
}
