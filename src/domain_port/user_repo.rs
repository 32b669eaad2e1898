use crate::application_port::AuthError;
use crate::domain_model::UserRecord;

/// A user about to be inserted; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub user_name: String,
    pub password_hash: String,
    pub nickname: String,
    pub email: String,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_name(&self, user_name: &str) -> Result<Option<UserRecord>, AuthError>;

    async fn create(&self, user: NewUserRecord) -> Result<(), AuthError>;
}
