use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use shared::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// Every stored rate is expressed against this currency.
pub const BASE_CURRENCY: &str = "USD";

/// Actor recorded on rows written by the background refresher.
pub const SYSTEM_ACTOR: &str = "rate-refresher";

/// ISO 4217 style code: exactly three ASCII letters, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(raw: &str) -> Result<Self> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code))
        } else {
            Err(Error::InvalidCode(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Rejects zero, negative, NaN and infinite rates.
pub fn validate_rate(rate: f64) -> Result<f64> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(Error::InvalidRate(rate))
    }
}

/// Durable row: the latest rate of one currency against [`BASE_CURRENCY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRate {
    pub code: CurrencyCode,
    pub rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

impl CurrencyRate {
    pub fn new(code: CurrencyCode, rate: f64, actor: impl Into<String>) -> Result<Self> {
        let rate = validate_rate(rate)?;
        let actor = actor.into();
        let now = Utc::now();
        Ok(Self {
            code,
            rate,
            created_at: now,
            updated_at: now,
            created_by: actor.clone(),
            updated_by: actor,
        })
    }

    /// Returns a copy carrying the new rate. `updated_at` never moves backwards.
    pub fn with_rate(
        &self,
        rate: f64,
        actor: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<Self> {
        let rate = validate_rate(rate)?;
        Ok(Self {
            rate,
            updated_at: at.max(self.updated_at),
            updated_by: actor.into(),
            ..self.clone()
        })
    }
}

/// One response of the rate provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateSnapshot {
    pub timestamp: i64,
    pub base: String,
    pub rates: HashMap<String, f64>,
}

impl ExchangeRateSnapshot {
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp, 0).single()
    }

    /// Pairs sorted by code so passes over a snapshot are deterministic.
    pub fn sorted_rates(&self) -> Vec<(&str, f64)> {
        let mut pairs: Vec<(&str, f64)> = self
            .rates
            .iter()
            .map(|(code, rate)| (code.as_str(), *rate))
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }
}
