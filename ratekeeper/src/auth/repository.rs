use super::error::AuthError;
use super::models::User;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: User) -> Result<User, AuthError>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    /// Find the user owning an API key
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError>;
}
