use crate::domain::CurrencyCode;
use async_trait::async_trait;
use shared::Result;

/// Read-side operations served from the cache, falling back to the store
#[async_trait]
pub trait RateOperations: Send + Sync + 'static {
    /// Rate of `code` against the base currency
    async fn resolve(&self, code: &CurrencyCode) -> Result<f64>;

    /// Convert `amount` of `from` into `to` through the base currency
    async fn convert(&self, from: &CurrencyCode, to: &CurrencyCode, amount: f64) -> Result<f64>;
}
