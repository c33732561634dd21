use axum::{http::StatusCode, Json};
use chrono::{DateTime, Utc};
use ratekeeper::auth::{Role, User};
use serde::Serialize;
use shared::Error;

#[derive(Serialize)]
pub struct HealthResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub result: f64,
}

/// Returned once on registration; the API key is not shown again
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for RegisterResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            api_key: user.api_key,
            created_at: user.created_at,
        }
    }
}

// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Map a core error to its HTTP status. Backend details stay in the logs.
pub fn error_response(err: &Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        Error::CurrencyNotFound(_) => StatusCode::NOT_FOUND,
        Error::AlreadyExists(_) => StatusCode::CONFLICT,
        Error::InvalidCode(_) | Error::InvalidRate(_) | Error::InvalidAmount(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::Storage(_) | Error::Cache(_) | Error::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let message = if err.is_client_error() {
        err.to_string()
    } else {
        "internal server error".to_string()
    };

    (status, Json(ErrorResponse::new(message)))
}
