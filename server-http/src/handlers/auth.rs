use crate::api::{ErrorResponse, RegisterRequest, RegisterResponse};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use ratekeeper::auth::{register_user, AuthError};
use tracing::{error, info};

/// POST /api/v1/auth/register - Create a regular user and issue its API key
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), (StatusCode, Json<ErrorResponse>)> {
    info!("REGISTER: username={}", req.username.trim());

    match register_user(state.users.as_ref(), &req.username).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user.into()))),
        Err(AuthError::InvalidUsername(reason)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!("invalid username: {}", reason))),
        )),
        Err(AuthError::UserAlreadyExists) => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("username already taken")),
        )),
        Err(e) => {
            error!("Failed to register user: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal server error")),
            ))
        }
    }
}
