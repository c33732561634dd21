use crate::api::{ErrorResponse, RateValue};
use axum::{http::StatusCode, Json};

#[derive(Debug, PartialEq)]
pub enum ValidationError {
    MissingParameters,
    InvalidNumber { field: &'static str, value: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingParameters => write!(f, "missing required parameters"),
            ValidationError::InvalidNumber { field, value } => {
                write!(f, "invalid {} '{}', expected a number", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn into_response(self) -> (StatusCode, Json<ErrorResponse>) {
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(self.to_string())))
    }
}

/// Parse a decimal that may use a comma as separator ("10,5")
fn parse_decimal(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

pub fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::MissingParameters);
    }
    parse_decimal("amount", raw)
}

/// Sign and range are checked by the core, this only reads the number
pub fn parse_rate(value: &RateValue) -> Result<f64, ValidationError> {
    match value {
        RateValue::Number(rate) => Ok(*rate),
        RateValue::Text(raw) => parse_decimal("rate", raw),
    }
}
