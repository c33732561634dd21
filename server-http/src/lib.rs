pub mod api;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod validation;

// Re-export key types
pub use middleware::RateLimiter;
pub use routes::build_router;
pub use state::AppState;
