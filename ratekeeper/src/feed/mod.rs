//! Client for the third-party exchange rate provider, with retry and backoff.

mod client;
mod error;
mod retry;

pub use client::OpenExchangeRatesClient;
pub use error::{FeedError, FeedFailure};
pub use retry::{classify, Backoff, RetryDecision, RetryReason};
