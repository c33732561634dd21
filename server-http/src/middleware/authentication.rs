use crate::api::ErrorResponse;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use ratekeeper::auth::User;
use tracing::{debug, error};

pub const API_KEY_HEADER: &str = "x-api-key";

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(message))).into_response()
}

/// Authentication middleware: resolves the `X-API-Key` header to a user
pub async fn api_key_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| unauthorized("Missing API key"))?;

    let user = match state.users.find_by_api_key(api_key).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!("Rejected unknown API key");
            return Err(unauthorized("Invalid API key"));
        }
        Err(e) => {
            error!("Failed to look up API key: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal server error")),
            )
                .into_response());
        }
    };

    // Attach user to request extensions
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Extract authenticated user from request extensions
pub fn get_authenticated_user(request: &Request) -> Option<&User> {
    request.extensions().get::<User>()
}
