use super::error::AuthError;
use super::models::{Role, User};
use super::repository::UserRepository;
use tracing::info;
use uuid::Uuid;

pub fn generate_api_key() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Create the default admin user
pub fn create_default_admin(username: String, api_key: String) -> User {
    User::new(username, Role::Admin, api_key)
}

/// Create the admin user unless `username` already exists.
///
/// Returns the key of a newly created admin when it had to be generated, so
/// the caller can hand it to the operator exactly once.
pub async fn ensure_default_admin(
    users: &dyn UserRepository,
    username: &str,
    api_key: Option<String>,
) -> Result<Option<String>, AuthError> {
    if users.find_by_username(username).await?.is_some() {
        info!("Admin user '{}' already exists", username);
        return Ok(None);
    }

    let generated = api_key.is_none();
    let api_key = api_key.unwrap_or_else(generate_api_key);
    users
        .create(create_default_admin(username.to_string(), api_key.clone()))
        .await?;
    info!("Created admin user '{}'", username);

    Ok(generated.then_some(api_key))
}
