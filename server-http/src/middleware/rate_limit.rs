use crate::api::ErrorResponse;
use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

/// Token bucket per client IP.
///
/// Once more than `max_clients` buckets are tracked, buckets idle long enough
/// to have refilled completely are dropped before a new client is admitted.
#[derive(Debug)]
pub struct RateLimiter {
    per_second: f64,
    burst: f64,
    max_clients: usize,
    buckets: DashMap<IpAddr, Bucket>,
}

impl RateLimiter {
    pub const DEFAULT_MAX_CLIENTS: usize = 10_000;

    pub fn new(per_second: u32, burst: u32) -> Self {
        Self {
            per_second: f64::from(per_second.max(1)),
            burst: f64::from(burst.max(1)),
            max_clients: Self::DEFAULT_MAX_CLIENTS,
            buckets: DashMap::new(),
        }
    }

    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients.max(1);
        self
    }

    /// Number of clients with a live bucket
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// Time after which an untouched bucket is full again
    fn idle_window(&self) -> Duration {
        Duration::from_secs_f64(self.burst / self.per_second)
    }

    fn evict_idle(&self, now: Instant) {
        let window = self.idle_window();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.refilled_at) < window);
        debug!(
            evicted = before - self.buckets.len(),
            "Evicted idle rate limit buckets"
        );
    }

    /// Take one token for `client`, false when its bucket is empty
    pub fn try_acquire(&self, client: IpAddr) -> bool {
        let now = Instant::now();
        // No entry guard may be held while retaining
        if self.buckets.len() >= self.max_clients && !self.buckets.contains_key(&client) {
            self.evict_idle(now);
        }

        let mut bucket = self.buckets.entry(client).or_insert(Bucket {
            tokens: self.burst,
            refilled_at: now,
        });

        let elapsed = now.duration_since(bucket.refilled_at).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.per_second).min(self.burst);
        bucket.refilled_at = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Requests without connection info (e.g. in-process tests) share one bucket
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !state.limiter.try_acquire(client) {
        debug!("Rate limit exceeded for {}", client);
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new("rate limit exceeded")),
        )
            .into_response());
    }

    Ok(next.run(request).await)
}
