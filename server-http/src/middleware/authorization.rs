use super::authentication::get_authenticated_user;
use crate::api::ErrorResponse;
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

/// Only lets admins through. Runs after `api_key_auth`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, Response> {
    let user = get_authenticated_user(&request).ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Authentication required")),
        )
            .into_response()
    })?;

    if !user.is_admin() {
        warn!("User '{}' denied admin access", user.username);
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new("Insufficient permissions")),
        )
            .into_response());
    }

    Ok(next.run(request).await)
}
