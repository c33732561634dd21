use crate::middleware::RateLimiter;
use ratekeeper::auth::UserRepository;
use ratekeeper::planes::control::CurrencyAdminOperations;
use ratekeeper::planes::data::RateOperations;
use std::sync::Arc;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub rates: Arc<dyn RateOperations>,
    pub admin: Arc<dyn CurrencyAdminOperations>,
    pub users: Arc<dyn UserRepository>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(
        rates: Arc<dyn RateOperations>,
        admin: Arc<dyn CurrencyAdminOperations>,
        users: Arc<dyn UserRepository>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            rates,
            admin,
            users,
            limiter: Arc::new(limiter),
        }
    }
}
