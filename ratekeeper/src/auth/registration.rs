use super::defaults::generate_api_key;
use super::error::AuthError;
use super::models::{Role, User};
use super::repository::UserRepository;
use tracing::info;

const MAX_USERNAME_LEN: usize = 64;

fn validate_username(raw: &str) -> Result<String, AuthError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("username is required".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AuthError::InvalidUsername(format!(
            "at most {} characters",
            MAX_USERNAME_LEN
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(AuthError::InvalidUsername(
            "only letters, digits, '-', '_' and '.' are allowed".to_string(),
        ));
    }
    Ok(username.to_string())
}

/// Register a regular user and issue it a fresh API key
pub async fn register_user(users: &dyn UserRepository, username: &str) -> Result<User, AuthError> {
    let username = validate_username(username)?;
    let user = users
        .create(User::new(username, Role::User, generate_api_key()))
        .await?;
    info!("Registered user '{}'", user.username);
    Ok(user)
}
