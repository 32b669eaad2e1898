use crate::domain_model::{TokenKind, TokenRecord};
use crate::domain_port::{TokenStore, TokenStoreError};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

/// Tokens as independent `<kind>@<user>` keys.
///
/// Redis expires access and pre-access keys itself, so the records handed
/// back carry no creation timestamps.
pub struct RedisTokenStore {
    conn: ConnectionManager,
    access_ttl_secs: u64,
    pre_access_ttl_secs: u64,
}

impl RedisTokenStore {
    pub fn new(conn: ConnectionManager, access_ttl: Duration, pre_access_ttl: Duration) -> Self {
        RedisTokenStore {
            conn,
            access_ttl_secs: access_ttl.as_secs().max(1),
            pre_access_ttl_secs: pre_access_ttl.as_secs().max(1),
        }
    }

    async fn read(&self, kind: TokenKind, user_name: &str) -> Result<String, TokenStoreError> {
        let key = kind.key_for(user_name);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| TokenStoreError::Read(e.to_string()))?;
        val.ok_or_else(|| TokenStoreError::Read(format!("{key} is absent")))
    }

    async fn write(
        &self,
        kind: TokenKind,
        user_name: &str,
        token: &str,
        ttl_secs: Option<u64>,
    ) -> Result<(), TokenStoreError> {
        let key = kind.key_for(user_name);
        let mut conn = self.conn.clone();
        let res: redis::RedisResult<()> = match ttl_secs {
            Some(ttl) => conn.set_ex(&key, token, ttl).await,
            None => conn.set(&key, token).await,
        };
        res.map_err(|e| TokenStoreError::write(kind, e))
    }
}

#[async_trait::async_trait]
impl TokenStore for RedisTokenStore {
    async fn set_refresh_token(
        &self,
        user_name: &str,
        token: &str,
    ) -> Result<(), TokenStoreError> {
        self.write(TokenKind::Refresh, user_name, token, None).await
    }

    async fn set_access_token(&self, user_name: &str, token: &str) -> Result<(), TokenStoreError> {
        self.write(TokenKind::Access, user_name, token, Some(self.access_ttl_secs))
            .await
    }

    async fn set_pre_access_token(
        &self,
        user_name: &str,
        token: &str,
    ) -> Result<(), TokenStoreError> {
        self.write(
            TokenKind::PreAccess,
            user_name,
            token,
            Some(self.pre_access_ttl_secs),
        )
        .await
    }

    async fn get_token_info(&self, user_name: &str) -> Result<TokenRecord, TokenStoreError> {
        let refresh_token = self.read(TokenKind::Refresh, user_name).await?;
        let access_token = self.read(TokenKind::Access, user_name).await?;
        let pre_access_token = self.read(TokenKind::PreAccess, user_name).await?;

        Ok(TokenRecord {
            user_name: user_name.to_string(),
            refresh_token,
            refresh_created_at: None,
            access_token,
            access_created_at: None,
            pre_access_token,
        })
    }
}
