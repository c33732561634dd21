pub mod authentication;
pub mod authorization;
pub mod rate_limit;

pub use authentication::{api_key_auth, API_KEY_HEADER};
pub use authorization::require_admin;
pub use rate_limit::{rate_limit, RateLimiter};
