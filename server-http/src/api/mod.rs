pub mod requests;
pub mod responses;

pub use requests::{
    ConvertQuery, CreateCurrencyRequest, RateValue, RegisterRequest, UpdateCurrencyRequest,
};
pub use responses::{
    error_response, ConvertResponse, ErrorResponse, HealthResponse, MessageResponse,
    RegisterResponse,
};
