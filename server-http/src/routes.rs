use crate::handlers;
use crate::middleware::{api_key_auth, rate_limit, require_admin};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    // Conversion and registration are public but rate limited per client
    let public = Router::new()
        .route(
            "/api/v1/currency/convert",
            get(handlers::convert_currency),
        )
        .route("/api/v1/auth/register", post(handlers::register))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    // Currency administration needs an admin API key
    let admin = Router::new()
        .route("/api/v1/currency", post(handlers::create_currency))
        .route(
            "/api/v1/currency/{code}",
            put(handlers::update_currency).delete(handlers::delete_currency),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), api_key_auth));

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .merge(public)
        .merge(admin)
        // Middleware
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
