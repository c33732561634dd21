use thiserror::Error;

/// Failure of a single request to the rate provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedFailure {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// A failure that retrying cannot fix
    #[error("rate feed rejected the request: {0}")]
    Rejected(FeedFailure),

    #[error("rate feed unavailable after {attempts} attempts: {last}")]
    Unavailable { attempts: u32, last: FeedFailure },

    #[error("rate feed request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for FeedFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedFailure::Timeout
        } else {
            // The url carries the app key in its query string
            FeedFailure::Network(err.without_url().to_string())
        }
    }
}
