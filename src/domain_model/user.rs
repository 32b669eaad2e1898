use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored user, including the password hash used at login.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: u64,
    pub user_name: String,
    pub nickname: String,
    pub email: String,
    pub password_hash: String,
    pub registered_at: DateTime<Utc>,
}

/// Registration input. `password` is plaintext and is hashed before storage.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub user_name: String,
    pub password: String,
    pub nickname: String,
    pub email: String,
}

/// Public profile, never carries authentication material.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: u64,
    pub user_name: String,
    pub nickname: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
}

impl From<UserRecord> for UserInfo {
    fn from(record: UserRecord) -> Self {
        UserInfo {
            id: record.id,
            user_name: record.user_name,
            nickname: record.nickname,
            email: record.email,
            registered_at: record.registered_at,
        }
    }
}
