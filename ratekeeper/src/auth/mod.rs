// Public API
pub mod defaults;
pub mod error;
pub mod models;
pub mod registration;
pub mod repository;
pub mod sled_repository;

// Re-export commonly used types
pub use defaults::{create_default_admin, ensure_default_admin, generate_api_key};
pub use error::AuthError;
pub use models::{Role, User};
pub use registration::register_user;
pub use repository::UserRepository;
pub use sled_repository::SledUserRepository;
