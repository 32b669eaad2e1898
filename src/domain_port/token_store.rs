use crate::domain_model::{TokenKind, TokenRecord};

/// Where refresh, access and pre-access tokens live.
///
/// Exactly one implementation is active per process, chosen at startup:
/// the durable store (which stamps creation times) or an external cache
/// (which expires access and pre-access keys on its own).
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Refresh tokens never expire implicitly.
    async fn set_refresh_token(&self, user_name: &str, token: &str)
    -> Result<(), TokenStoreError>;

    async fn set_access_token(&self, user_name: &str, token: &str)
    -> Result<(), TokenStoreError>;

    async fn set_pre_access_token(
        &self,
        user_name: &str,
        token: &str,
    ) -> Result<(), TokenStoreError>;

    /// Never returns a partial record: a missing piece is an error.
    async fn get_token_info(&self, user_name: &str) -> Result<TokenRecord, TokenStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("token record not found")]
    NotFound,
    #[error("write {kind} failed: {reason}")]
    Write { kind: TokenKind, reason: String },
    #[error("read failed: {0}")]
    Read(String),
    #[error("malformed timestamp: {0}")]
    TimeParse(String),
}

impl TokenStoreError {
    pub fn write(kind: TokenKind, reason: impl ToString) -> Self {
        TokenStoreError::Write {
            kind,
            reason: reason.to_string(),
        }
    }
}
