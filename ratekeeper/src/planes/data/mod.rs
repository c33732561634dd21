pub mod operation;
pub mod rate_resolver;

pub use operation::RateOperations;
pub use rate_resolver::RateResolver;
