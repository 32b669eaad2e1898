use super::ExpiringStore;
use crate::domain_port::{SessionStore, TokenStoreError};
use std::time::Duration;

pub struct MemorySessionStore {
    sessions: ExpiringStore<String>,
}

impl MemorySessionStore {
    pub fn start(session_expires_in: Duration) -> Self {
        Self {
            sessions: ExpiringStore::start(session_expires_in),
        }
    }

    pub fn close(&self) {
        self.sessions.close();
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn save_session(&self, user_name: &str, session: &str) -> Result<(), TokenStoreError> {
        self.sessions.set(user_name, session.to_string());
        Ok(())
    }

    async fn load_session(&self, user_name: &str) -> Result<Option<String>, TokenStoreError> {
        Ok(self.sessions.get(user_name))
    }
}
