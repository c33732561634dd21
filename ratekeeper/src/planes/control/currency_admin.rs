use crate::domain::{validate_rate, CurrencyCode, CurrencyRate};
use crate::planes::control::operation::CurrencyAdminOperations;
use crate::ports::{CurrencyStore, RateCache};
use async_trait::async_trait;
use chrono::Utc;
use shared::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Write-through administration of currency rows.
/// The store is authoritative; cache failures are logged and otherwise ignored.
#[derive(Clone)]
pub struct CurrencyAdmin {
    store: Arc<dyn CurrencyStore>,
    cache: Arc<dyn RateCache>,
    ttl: Duration,
}

impl CurrencyAdmin {
    pub fn new(store: Arc<dyn CurrencyStore>, cache: Arc<dyn RateCache>, ttl: Duration) -> Self {
        Self { store, cache, ttl }
    }

    async fn cache_rate(&self, row: &CurrencyRate) {
        if let Err(e) = self.cache.set(&row.code, row.rate, self.ttl).await {
            warn!("Failed to cache rate for {}: {}", row.code, e);
        }
    }
}

impl std::fmt::Debug for CurrencyAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyAdmin")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[async_trait]
impl CurrencyAdminOperations for CurrencyAdmin {
    async fn add_currency(
        &self,
        code: CurrencyCode,
        rate: f64,
        actor: &str,
    ) -> Result<CurrencyRate> {
        let row = CurrencyRate::new(code, rate, actor)?;

        self.store.create(row.clone()).await?;
        self.cache_rate(&row).await;

        info!("Currency {} added by {} at rate {}", row.code, actor, row.rate);
        Ok(row)
    }

    async fn update_currency(
        &self,
        code: CurrencyCode,
        rate: f64,
        actor: &str,
    ) -> Result<CurrencyRate> {
        let rate = validate_rate(rate)?;

        let existing = self
            .store
            .get_by_code(&code)
            .await?
            .ok_or_else(|| Error::CurrencyNotFound(code.to_string()))?;
        let row = existing.with_rate(rate, actor, Utc::now())?;

        self.store.update(row.clone()).await?;
        self.cache_rate(&row).await;

        info!("Currency {} updated by {} to rate {}", row.code, actor, row.rate);
        Ok(row)
    }

    async fn remove_currency(&self, code: &CurrencyCode) -> Result<()> {
        self.store.delete(code).await?;

        if let Err(e) = self.cache.delete(code).await {
            warn!("Failed to evict {} from cache: {}", code, e);
        }

        info!("Currency {} removed", code);
        Ok(())
    }
}
