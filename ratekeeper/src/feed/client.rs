use super::error::{FeedError, FeedFailure};
use super::retry::{classify, Backoff, RetryDecision};
use crate::domain::ExchangeRateSnapshot;
use crate::ports::RateFeed;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::config::FeedSettings;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// HTTP client for the openexchangerates.org `latest.json` endpoint
#[derive(Clone)]
pub struct OpenExchangeRatesClient {
    http: Client,
    base_url: String,
    api_key: String,
    max_attempts: u32,
    backoff: Backoff,
    timeout: Duration,
}

impl OpenExchangeRatesClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://openexchangerates.org/api";
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::new(Self::DEFAULT_BASE_DELAY, Self::DEFAULT_MAX_DELAY),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn from_settings(settings: &FeedSettings) -> Self {
        Self::new(settings.api_key.clone())
            .with_base_url(settings.base_url.clone())
            .with_max_attempts(settings.max_attempts)
            .with_backoff(settings.base_delay, settings.max_delay)
            .with_timeout(settings.request_timeout)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// At least one attempt is always made
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.backoff = Backoff::new(base_delay, max_delay);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn attempt(&self) -> Result<ExchangeRateSnapshot, FeedFailure> {
        let url = format!("{}/latest.json", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("app_id", self.api_key.as_str())])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FeedFailure::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FeedFailure::MalformedBody(e.to_string()))
    }
}

#[async_trait]
impl RateFeed for OpenExchangeRatesClient {
    async fn fetch_rates(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ExchangeRateSnapshot, FeedError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(attempt, max_attempts = self.max_attempts, "Requesting latest rates");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FeedError::Cancelled),
                outcome = self.attempt() => outcome,
            };

            let failure = match outcome {
                Ok(snapshot) => {
                    info!(attempt, rates = snapshot.rates.len(), "Fetched latest rates");
                    return Ok(snapshot);
                }
                Err(failure) => failure,
            };

            let reason = match classify(&failure) {
                RetryDecision::GiveUp => {
                    error!(attempt, error = %failure, "Rate feed failed, not retrying");
                    return Err(FeedError::Rejected(failure));
                }
                RetryDecision::Retry(reason) => reason,
            };

            if attempt >= self.max_attempts {
                error!(attempt, error = %failure, "Rate feed failed, attempts exhausted");
                return Err(FeedError::Unavailable {
                    attempts: attempt,
                    last: failure,
                });
            }

            let delay = self.backoff.delay(attempt - 1);
            warn!(
                attempt,
                ?reason,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Rate feed attempt failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FeedError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
