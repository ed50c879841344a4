use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer of the bank. Password hashing happens before a user reaches the store;
/// only the hash is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hash_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
