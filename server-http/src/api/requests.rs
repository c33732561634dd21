use serde::Deserialize;

/// Query of `GET /api/v1/currency/convert`
#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub amount: String,
}

/// A rate sent either as a JSON number or as a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RateValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
pub struct CreateCurrencyRequest {
    pub code: String,
    pub rate_to_usd: RateValue,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCurrencyRequest {
    pub rate_to_usd: RateValue,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
}
