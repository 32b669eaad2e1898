use crate::domain_model::TokenKind;
use crate::domain_port::{SessionStore, TokenStoreError};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;

pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, session_expires_in: Duration) -> Self {
        RedisSessionStore {
            conn,
            ttl_secs: session_expires_in.as_secs().max(1),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn save_session(&self, user_name: &str, session: &str) -> Result<(), TokenStoreError> {
        let key = TokenKind::Session.key_for(user_name);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, session, self.ttl_secs)
            .await
            .map_err(|e| TokenStoreError::write(TokenKind::Session, e))?;
        Ok(())
    }

    async fn load_session(&self, user_name: &str) -> Result<Option<String>, TokenStoreError> {
        let key = TokenKind::Session.key_for(user_name);
        let mut conn = self.conn.clone();
        conn.get(&key)
            .await
            .map_err(|e| TokenStoreError::Read(e.to_string()))
    }
}
