use crate::domain::{CurrencyCode, CurrencyRate};
use async_trait::async_trait;
use shared::Result;

#[async_trait]
pub trait CurrencyAdminOperations: Send + Sync + 'static {
    async fn add_currency(&self, code: CurrencyCode, rate: f64, actor: &str)
        -> Result<CurrencyRate>;

    async fn update_currency(
        &self,
        code: CurrencyCode,
        rate: f64,
        actor: &str,
    ) -> Result<CurrencyRate>;

    async fn remove_currency(&self, code: &CurrencyCode) -> Result<()>;
}
