use crate::api::{
    error_response, ConvertQuery, ConvertResponse, CreateCurrencyRequest, ErrorResponse,
    MessageResponse, UpdateCurrencyRequest,
};
use crate::state::AppState;
use crate::validation::{parse_amount, parse_rate, ValidationError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use ratekeeper::auth::User;
use ratekeeper::domain::CurrencyCode;
use tracing::{error, info};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn parse_code(raw: &str) -> Result<CurrencyCode, ApiError> {
    CurrencyCode::parse(raw).map_err(|e| error_response(&e))
}

fn failed(operation: &str, err: shared::Error) -> ApiError {
    if !err.is_client_error() {
        error!("{} failed: {}", operation, err);
    }
    error_response(&err)
}

/// GET /api/v1/currency/convert?from=&to=&amount=
pub async fn convert_currency(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
) -> Result<Json<ConvertResponse>, ApiError> {
    if query.from.trim().is_empty() || query.to.trim().is_empty() {
        return Err(ValidationError::MissingParameters.into_response());
    }
    let from = parse_code(&query.from)?;
    let to = parse_code(&query.to)?;
    let amount = parse_amount(&query.amount).map_err(ValidationError::into_response)?;

    let result = state
        .rates
        .convert(&from, &to, amount)
        .await
        .map_err(|e| failed("CONVERT", e))?;

    Ok(Json(ConvertResponse {
        from: from.to_string(),
        to: to.to_string(),
        amount,
        result,
    }))
}

/// POST /api/v1/currency
pub async fn create_currency(
    State(state): State<AppState>,
    Extension(current_user): Extension<User>,
    Json(req): Json<CreateCurrencyRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let code = parse_code(&req.code)?;
    let rate = parse_rate(&req.rate_to_usd).map_err(ValidationError::into_response)?;

    info!(
        "ADD_CURRENCY: code={}, requested_by={}",
        code, current_user.username
    );

    state
        .admin
        .add_currency(code, rate, &current_user.username)
        .await
        .map_err(|e| failed("ADD_CURRENCY", e))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("currency added successfully")),
    ))
}

/// PUT /api/v1/currency/{code}
pub async fn update_currency(
    State(state): State<AppState>,
    Extension(current_user): Extension<User>,
    Path(code): Path<String>,
    Json(req): Json<UpdateCurrencyRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let code = parse_code(&code)?;
    let rate = parse_rate(&req.rate_to_usd).map_err(ValidationError::into_response)?;

    info!(
        "UPDATE_CURRENCY: code={}, requested_by={}",
        code, current_user.username
    );

    state
        .admin
        .update_currency(code, rate, &current_user.username)
        .await
        .map_err(|e| failed("UPDATE_CURRENCY", e))?;

    Ok(Json(MessageResponse::new("currency updated successfully")))
}

/// DELETE /api/v1/currency/{code}
pub async fn delete_currency(
    State(state): State<AppState>,
    Extension(current_user): Extension<User>,
    Path(code): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let code = parse_code(&code)?;

    info!(
        "REMOVE_CURRENCY: code={}, requested_by={}",
        code, current_user.username
    );

    state
        .admin
        .remove_currency(&code)
        .await
        .map_err(|e| failed("REMOVE_CURRENCY", e))?;

    Ok(Json(MessageResponse::new("currency removed successfully")))
}
