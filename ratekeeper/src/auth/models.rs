use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May add, update and remove currencies
    Admin,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, role: Role, api_key: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            role,
            api_key,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
