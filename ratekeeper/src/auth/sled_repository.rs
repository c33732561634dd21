use super::error::AuthError;
use super::models::User;
use super::repository::UserRepository;
use async_trait::async_trait;
use sled::Db;
use std::path::Path;

const USERS_TREE: &str = "users";
const USERS_BY_USERNAME_TREE: &str = "users_by_username";
const USERS_BY_API_KEY_TREE: &str = "users_by_api_key";

#[derive(Clone)]
pub struct SledUserRepository {
    db: Db,
}

impl SledUserRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, AuthError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Share a database already opened for the currency store
    pub fn from_db(db: Db) -> Self {
        Self { db }
    }

    fn users_tree(&self) -> Result<sled::Tree, AuthError> {
        Ok(self.db.open_tree(USERS_TREE)?)
    }

    fn users_by_username_tree(&self) -> Result<sled::Tree, AuthError> {
        Ok(self.db.open_tree(USERS_BY_USERNAME_TREE)?)
    }

    fn users_by_api_key_tree(&self) -> Result<sled::Tree, AuthError> {
        Ok(self.db.open_tree(USERS_BY_API_KEY_TREE)?)
    }

    fn load(&self, user_id: &[u8]) -> Result<Option<User>, AuthError> {
        match self.users_tree()?.get(user_id)? {
            Some(user_data) => Ok(Some(serde_json::from_slice(&user_data)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for SledUserRepository {
    async fn create(&self, user: User) -> Result<User, AuthError> {
        let users_tree = self.users_tree()?;
        let username_tree = self.users_by_username_tree()?;
        let api_key_tree = self.users_by_api_key_tree()?;

        // Claim the username first so two creators can't both win
        if username_tree
            .compare_and_swap(
                user.username.as_bytes(),
                None as Option<&[u8]>,
                Some(user.id.as_bytes()),
            )?
            .is_err()
        {
            return Err(AuthError::UserAlreadyExists);
        }

        if api_key_tree
            .compare_and_swap(
                user.api_key.as_bytes(),
                None as Option<&[u8]>,
                Some(user.id.as_bytes()),
            )?
            .is_err()
        {
            username_tree.remove(user.username.as_bytes())?;
            return Err(AuthError::ApiKeyInUse);
        }

        let user_json = serde_json::to_vec(&user)?;
        users_tree.insert(user.id.as_bytes(), user_json)?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        match self.users_by_username_tree()?.get(username.as_bytes())? {
            Some(user_id) => self.load(&user_id),
            None => Ok(None),
        }
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError> {
        match self.users_by_api_key_tree()?.get(api_key.as_bytes())? {
            Some(user_id) => self.load(&user_id),
            None => Ok(None),
        }
    }
}
