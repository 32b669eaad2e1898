use crate::domain_model::{NewUser, TokenId, TokenKind, UserInfo};
use crate::domain_port::TokenStoreError;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("param not valid")]
    ParamInvalid,
    #[error("user not found")]
    UserNotFound,
    #[error("user already exists")]
    UserExists,
    #[error("password invalid")]
    PasswordInvalid,
    #[error("refresh token is invalid")]
    RefreshTokenInvalid,
    #[error("access token is invalid")]
    AccessTokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("token not found")]
    TokenNotFound,
    #[error("session is invalid")]
    SessionInvalid,
    #[error("write {kind} failed: {reason}")]
    TokenWriteFailed { kind: TokenKind, reason: String },
    #[error("backend read failed: {0}")]
    BackendReadFailed(String),
    #[error("parse stored time failed: {0}")]
    TimeParseFailed(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<TokenStoreError> for AuthError {
    fn from(e: TokenStoreError) -> Self {
        match e {
            TokenStoreError::NotFound => AuthError::TokenNotFound,
            TokenStoreError::Write { kind, reason } => AuthError::TokenWriteFailed { kind, reason },
            TokenStoreError::Read(reason) => AuthError::BackendReadFailed(reason),
            TokenStoreError::TimeParse(reason) => AuthError::TimeParseFailed(reason),
        }
    }
}

/// Token lifetimes enforced by the authority.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token_expires_in: Duration,
    pub pre_token_expire_in: Duration,
    pub session_expires_in: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_expires_in: Duration::from_secs(7 * 24 * 60 * 60), // one week
            pre_token_expire_in: Duration::from_secs(2 * 60 * 60),   // two hours
            session_expires_in: Duration::from_secs(24 * 60 * 60),   // one day
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub refresh_token: String,
    pub access_token: String,
    pub session_token: String,
    pub access_token_expires_in: Duration,
    pub session_expires_in: Duration,
}

pub trait TokenIssuer: Send + Sync {
    fn next_identifier(&self) -> TokenId;

    /// Opaque credential; nothing about the identifier is recoverable from it.
    fn new_token(&self) -> String;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, user: NewUser) -> Result<(), AuthError>;

    async fn login(&self, user_name: &str, password: &str) -> Result<LoginResult, AuthError>;

    async fn check_access_token(&self, user_name: &str, access_token: &str)
    -> Result<(), AuthError>;

    /// Rotate the access token. The old one stays valid for the grace window.
    async fn reset_access_token(
        &self,
        user_name: &str,
        refresh_token: &str,
    ) -> Result<String, AuthError>;

    /// Validate a web session and slide its expiry forward.
    async fn check_session(&self, user_name: &str, session: &str) -> Result<(), AuthError>;

    async fn kill_offline(&self, user_name: &str) -> Result<(), AuthError>;

    async fn get_user_info(&self, user_name: &str) -> Result<UserInfo, AuthError>;
}
