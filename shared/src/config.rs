use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
#[error("configuration errors occurred: {}", .0.join("; "))]
pub struct ConfigError(pub Vec<String>);

/// Settings for the third-party rate provider.
#[derive(Clone)]
pub struct FeedSettings {
    pub base_url: String,
    pub api_key: String,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub request_timeout: Duration,
}

// The api key never ends up in logs.
impl std::fmt::Debug for FeedSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub data_dir: String,
    pub feed: FeedSettings,
    pub refresh_interval: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
    pub rate_limit_rps: u32,
    pub rate_limit_burst: u32,
    pub admin_username: String,
    pub admin_api_key: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("http_port", &self.http_port)
            .field("data_dir", &self.data_dir)
            .field("feed", &self.feed)
            .field("refresh_interval", &self.refresh_interval)
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_capacity", &self.cache_capacity)
            .field("rate_limit_rps", &self.rate_limit_rps)
            .field("rate_limit_burst", &self.rate_limit_burst)
            .field("admin_username", &self.admin_username)
            .field("admin_api_key", &self.admin_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_HTTP_PORT: u16 = 8080;
    const DEFAULT_DATA_DIR: &'static str = "./data";
    const DEFAULT_FEED_BASE_URL: &'static str = "https://openexchangerates.org/api";
    const DEFAULT_FEED_MAX_ATTEMPTS: u32 = 3;
    const DEFAULT_FEED_BASE_DELAY_MS: u64 = 1_000;
    const DEFAULT_FEED_MAX_DELAY_MS: u64 = 30_000;
    const DEFAULT_FEED_TIMEOUT_MS: u64 = 10_000;
    const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3_600;
    const DEFAULT_CACHE_TTL_SECS: u64 = 3_600;
    const DEFAULT_CACHE_CAPACITY: u64 = 10_000;
    const DEFAULT_RATE_LIMIT_RPS: u32 = 10;
    const DEFAULT_RATE_LIMIT_BURST: u32 = 10;
    const DEFAULT_ADMIN_USERNAME: &'static str = "admin";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    /// Every problem is collected so a misconfigured deployment reports them all at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();

        let http_port: u16 = parse_or(
            &lookup,
            "RATEKEEPER_HTTP_PORT",
            Self::DEFAULT_HTTP_PORT,
            &mut errors,
        );
        let max_attempts: u32 = parse_or(
            &lookup,
            "RATEKEEPER_FEED_MAX_ATTEMPTS",
            Self::DEFAULT_FEED_MAX_ATTEMPTS,
            &mut errors,
        );
        let base_delay_ms: u64 = parse_or(
            &lookup,
            "RATEKEEPER_FEED_BASE_DELAY_MS",
            Self::DEFAULT_FEED_BASE_DELAY_MS,
            &mut errors,
        );
        let max_delay_ms: u64 = parse_or(
            &lookup,
            "RATEKEEPER_FEED_MAX_DELAY_MS",
            Self::DEFAULT_FEED_MAX_DELAY_MS,
            &mut errors,
        );
        let timeout_ms: u64 = parse_or(
            &lookup,
            "RATEKEEPER_FEED_TIMEOUT_MS",
            Self::DEFAULT_FEED_TIMEOUT_MS,
            &mut errors,
        );
        let refresh_secs: u64 = parse_or(
            &lookup,
            "RATEKEEPER_REFRESH_INTERVAL_SECS",
            Self::DEFAULT_REFRESH_INTERVAL_SECS,
            &mut errors,
        );
        let cache_ttl_secs: u64 = parse_or(
            &lookup,
            "RATEKEEPER_CACHE_TTL_SECS",
            Self::DEFAULT_CACHE_TTL_SECS,
            &mut errors,
        );
        let cache_capacity: u64 = parse_or(
            &lookup,
            "RATEKEEPER_CACHE_CAPACITY",
            Self::DEFAULT_CACHE_CAPACITY,
            &mut errors,
        );
        let rate_limit_rps: u32 = parse_or(
            &lookup,
            "RATEKEEPER_RATE_LIMIT_RPS",
            Self::DEFAULT_RATE_LIMIT_RPS,
            &mut errors,
        );
        let rate_limit_burst: u32 = parse_or(
            &lookup,
            "RATEKEEPER_RATE_LIMIT_BURST",
            Self::DEFAULT_RATE_LIMIT_BURST,
            &mut errors,
        );

        if max_attempts == 0 {
            errors.push("RATEKEEPER_FEED_MAX_ATTEMPTS must be at least 1".to_string());
        }
        if base_delay_ms > max_delay_ms {
            errors.push(
                "RATEKEEPER_FEED_BASE_DELAY_MS must not exceed RATEKEEPER_FEED_MAX_DELAY_MS"
                    .to_string(),
            );
        }
        if refresh_secs == 0 {
            errors.push("RATEKEEPER_REFRESH_INTERVAL_SECS must be at least 1".to_string());
        }
        if rate_limit_rps == 0 || rate_limit_burst == 0 {
            errors.push("rate limit settings must be at least 1".to_string());
        }

        let api_key = match lookup("RATEKEEPER_FEED_API_KEY").filter(|v| !v.is_empty()) {
            Some(key) => key,
            None => {
                errors.push("RATEKEEPER_FEED_API_KEY is not set".to_string());
                String::new()
            }
        };

        let admin_api_key = lookup("RATEKEEPER_ADMIN_API_KEY").filter(|v| !v.is_empty());
        if admin_api_key.is_none() {
            warn!("RATEKEEPER_ADMIN_API_KEY not set, a key is generated for a new admin user");
        }

        if !errors.is_empty() {
            return Err(ConfigError(errors));
        }

        Ok(Self {
            host: lookup("RATEKEEPER_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            http_port,
            data_dir: lookup("RATEKEEPER_DATA_DIR")
                .unwrap_or_else(|| Self::DEFAULT_DATA_DIR.to_string()),
            feed: FeedSettings {
                base_url: lookup("RATEKEEPER_FEED_BASE_URL")
                    .unwrap_or_else(|| Self::DEFAULT_FEED_BASE_URL.to_string()),
                api_key,
                max_attempts,
                base_delay: Duration::from_millis(base_delay_ms),
                max_delay: Duration::from_millis(max_delay_ms),
                request_timeout: Duration::from_millis(timeout_ms),
            },
            refresh_interval: Duration::from_secs(refresh_secs),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache_capacity,
            rate_limit_rps,
            rate_limit_burst,
            admin_username: lookup("RATEKEEPER_ADMIN_USERNAME")
                .unwrap_or_else(|| Self::DEFAULT_ADMIN_USERNAME.to_string()),
            admin_api_key,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T, errors: &mut Vec<String>) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|e| {
            errors.push(format!("invalid {}: {}", key, e));
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_api_key() {
        let config = Config::from_lookup(lookup_from(&[("RATEKEEPER_FEED_API_KEY", "secret")]))
            .unwrap();

        assert_eq!(config.http_port, 8080);
        assert_eq!(config.feed.max_attempts, 3);
        assert_eq!(config.feed.base_delay, Duration::from_secs(1));
        assert_eq!(config.feed.max_delay, Duration::from_secs(30));
        assert_eq!(config.refresh_interval, Duration::from_secs(3600));
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.admin_username, "admin");
        assert!(config.admin_api_key.is_none());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.0.iter().any(|e| e.contains("RATEKEEPER_FEED_API_KEY")));
    }

    #[test]
    fn test_all_errors_are_collected() {
        let err = Config::from_lookup(lookup_from(&[
            ("RATEKEEPER_HTTP_PORT", "not-a-port"),
            ("RATEKEEPER_FEED_MAX_ATTEMPTS", "0"),
        ]))
        .unwrap_err();

        assert_eq!(err.0.len(), 3);
        assert!(err.to_string().contains("RATEKEEPER_HTTP_PORT"));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = Config::from_lookup(lookup_from(&[
            ("RATEKEEPER_FEED_API_KEY", "secret"),
            ("RATEKEEPER_ADMIN_API_KEY", "hunter2"),
        ]))
        .unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("secret"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("RATEKEEPER_FEED_API_KEY", "secret"),
            ("RATEKEEPER_RATE_LIMIT_RPS", "4294967296"),
            ("RATEKEEPER_FEED_MAX_ATTEMPTS", "4294967296"),
            ("RATEKEEPER_HTTP_PORT", "65536"),
        ]))
        .unwrap_err();

        assert_eq!(err.0.len(), 3);
        assert!(err.0.iter().any(|e| e.starts_with("invalid RATEKEEPER_RATE_LIMIT_RPS")));
        assert!(err.0.iter().any(|e| e.starts_with("invalid RATEKEEPER_FEED_MAX_ATTEMPTS")));
        assert!(err.0.iter().any(|e| e.starts_with("invalid RATEKEEPER_HTTP_PORT")));
        assert!(!err.to_string().contains("must be at least 1"));
    }
}
