// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("currency not found: {0}")]
    CurrencyNotFound(String),
    #[error("currency already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid currency code '{0}', must be 3 letters following ISO 4217")]
    InvalidCode(String),
    #[error("invalid rate {0}, must be a positive number")]
    InvalidRate(f64),
    #[error("invalid amount {0}, must be a non-negative number")]
    InvalidAmount(f64),
    #[error("storage: {0}")]
    Storage(String),
    #[error("cache: {0}")]
    Cache(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    /// Errors caused by the caller's input rather than a backend failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::CurrencyNotFound(_)
                | Error::AlreadyExists(_)
                | Error::InvalidCode(_)
                | Error::InvalidRate(_)
                | Error::InvalidAmount(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
