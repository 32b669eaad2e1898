use super::TokenStoreError;

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Save (or re-save, restarting its lifetime) the session of a user.
    async fn save_session(&self, user_name: &str, session: &str) -> Result<(), TokenStoreError>;

    /// `None` when the session has expired or was never written.
    async fn load_session(&self, user_name: &str) -> Result<Option<String>, TokenStoreError>;
}
