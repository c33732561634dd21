pub mod auth;
pub mod domain;
pub mod feed;
pub mod persistence;
pub mod planes;
pub mod ports;
pub mod refresher;

#[cfg(test)]
pub(crate) mod testing;

pub use domain::{CurrencyCode, CurrencyRate, ExchangeRateSnapshot};
pub use refresher::{RateRefresher, RefreshError, RefreshPhase, RefreshReport, RefresherHandle};
