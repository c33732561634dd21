#![deny(clippy::all)]

use crate::domain::{CurrencyCode, CurrencyRate, ExchangeRateSnapshot};
use crate::feed::FeedError;
use async_trait::async_trait;
use shared::Result;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// Ports are the pluggable extension points for the backends the core talks to

/// Port for the durable store holding one row per currency
#[async_trait]
pub trait CurrencyStore: Send + Sync + 'static {
    async fn get_by_code(&self, code: &CurrencyCode) -> Result<Option<CurrencyRate>>;

    /// Fails with `AlreadyExists` when a row for the code is present
    async fn create(&self, rate: CurrencyRate) -> Result<()>;

    /// Fails with `CurrencyNotFound` when no row for the code is present
    async fn update(&self, rate: CurrencyRate) -> Result<()>;

    /// Fails with `CurrencyNotFound` when no row for the code is present
    async fn delete(&self, code: &CurrencyCode) -> Result<()>;
}

/// Port for the volatile rate cache (e.g., Moka)
#[async_trait]
pub trait RateCache: Send + Sync + 'static {
    async fn get(&self, code: &CurrencyCode) -> Result<Option<f64>>;
    async fn set(&self, code: &CurrencyCode, rate: f64, ttl: Duration) -> Result<()>;
    async fn delete(&self, code: &CurrencyCode) -> Result<()>;
}

/// Port for the third-party rate provider
#[async_trait]
pub trait RateFeed: Send + Sync + 'static {
    async fn fetch_rates(
        &self,
        cancel: &CancellationToken,
    ) -> std::result::Result<ExchangeRateSnapshot, FeedError>;
}
