pub mod auth;
pub mod currency;
pub mod health;

pub use currency::{convert_currency, create_currency, delete_currency, update_currency};
pub use auth::register;
pub use health::health_check;
