use crate::application_port::AuthError;
use crate::domain_model::UserRecord;
use crate::domain_port::{NewUserRecord, UserRepo};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryUserRepo {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn get_by_name(&self, user_name: &str) -> Result<Option<UserRecord>, AuthError> {
        let users = self
            .users
            .lock()
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok(users.get(user_name).cloned())
    }

    async fn create(&self, user: NewUserRecord) -> Result<(), AuthError> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        if users.contains_key(&user.user_name) {
            return Err(AuthError::UserExists);
        }
        let record = UserRecord {
            id: users.len() as u64 + 1,
            user_name: user.user_name.clone(),
            nickname: user.nickname,
            email: user.email,
            password_hash: user.password_hash,
            registered_at: Utc::now(),
        };
        users.insert(user.user_name, record);
        Ok(())
    }
}
