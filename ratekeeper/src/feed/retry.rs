use super::error::FeedFailure;
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    Timeout,
    ServerError,
    RateLimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(RetryReason),
    GiveUp,
}

/// Decide whether a failed attempt is worth repeating.
///
/// Timeouts, 5xx and 429 are transient. Any other status, an unparseable body
/// and connection-level errors other than timeouts are not.
pub fn classify(failure: &FeedFailure) -> RetryDecision {
    match failure {
        FeedFailure::Timeout => RetryDecision::Retry(RetryReason::Timeout),
        FeedFailure::Status(429) => RetryDecision::Retry(RetryReason::RateLimited),
        FeedFailure::Status(status) if (500..600).contains(status) => {
            RetryDecision::Retry(RetryReason::ServerError)
        }
        FeedFailure::Status(_) | FeedFailure::Network(_) | FeedFailure::MalformedBody(_) => {
            RetryDecision::GiveUp
        }
    }
}

/// Capped exponential backoff with additive jitter
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// `min(base * 2^attempt, max)` for a 0-indexed attempt
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .unwrap_or(self.max)
            .min(self.max)
    }

    /// The ceiling plus a jitter drawn uniformly from `[0, ceiling / 2]`
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = self.ceiling(attempt);
        let half = u64::try_from(delay.as_nanos() / 2).unwrap_or(u64::MAX);
        let jitter = rand::rng().random_range(0..=half);
        delay + Duration::from_nanos(jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_transient_failures() {
        assert_eq!(
            classify(&FeedFailure::Timeout),
            RetryDecision::Retry(RetryReason::Timeout)
        );
        assert_eq!(
            classify(&FeedFailure::Status(429)),
            RetryDecision::Retry(RetryReason::RateLimited)
        );
        for status in [500, 502, 503, 504, 599] {
            assert_eq!(
                classify(&FeedFailure::Status(status)),
                RetryDecision::Retry(RetryReason::ServerError)
            );
        }
    }

    #[test]
    fn test_classify_permanent_failures() {
        for failure in [
            FeedFailure::Status(400),
            FeedFailure::Status(401),
            FeedFailure::Status(404),
            FeedFailure::Status(302),
            FeedFailure::Network("connection refused".to_string()),
            FeedFailure::MalformedBody("expected value".to_string()),
        ] {
            assert_eq!(classify(&failure), RetryDecision::GiveUp, "{failure}");
        }
    }

    #[test]
    fn test_backoff_ceiling_doubles_then_caps() {
        let backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(30));

        assert_eq!(backoff.ceiling(0), Duration::from_secs(1));
        assert_eq!(backoff.ceiling(1), Duration::from_secs(2));
        assert_eq!(backoff.ceiling(4), Duration::from_secs(16));
        assert_eq!(backoff.ceiling(5), Duration::from_secs(30));
        assert_eq!(backoff.ceiling(40), Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_jitter_stays_within_half_the_delay() {
        let backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(30));

        for attempt in 0..4 {
            let ceiling = backoff.ceiling(attempt);
            for _ in 0..200 {
                let delay = backoff.delay(attempt);
                assert!(delay >= ceiling);
                assert!(delay <= ceiling + ceiling / 2);
            }
        }
    }
}
