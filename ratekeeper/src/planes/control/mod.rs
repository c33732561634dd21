pub mod currency_admin;
pub mod operation;

pub use currency_admin::CurrencyAdmin;
pub use operation::CurrencyAdminOperations;
