use crate::domain_model::{TokenKind, TokenRecord};
use crate::domain_port::{TokenStore, TokenStoreError};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Durable-store stand-in keeping one record per user in process memory.
///
/// Behaves like the relational backend: setters stamp creation times and
/// nothing expires on its own.
#[derive(Default)]
pub struct MemoryTokenStore {
    records: Mutex<HashMap<String, TokenRecord>>,
    #[cfg(test)]
    failing: Mutex<Option<TokenKind>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, TokenRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn upsert(&self, kind: TokenKind, user_name: &str, token: &str) -> Result<(), TokenStoreError> {
        self.injected_failure(kind)?;

        let now = Utc::now();
        let mut records = self.records();
        let record = records
            .entry(user_name.to_string())
            .or_insert_with(|| TokenRecord {
                user_name: user_name.to_string(),
                refresh_token: String::new(),
                refresh_created_at: Some(now),
                access_token: String::new(),
                access_created_at: Some(now),
                pre_access_token: String::new(),
            });

        match kind {
            TokenKind::Refresh => {
                record.refresh_token = token.to_string();
                record.refresh_created_at = Some(now);
            }
            TokenKind::Access => {
                record.access_token = token.to_string();
                record.access_created_at = Some(now);
            }
            TokenKind::PreAccess => record.pre_access_token = token.to_string(),
            TokenKind::Session => {
                return Err(TokenStoreError::write(kind, "sessions are not token records"));
            }
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn injected_failure(&self, _kind: TokenKind) -> Result<(), TokenStoreError> {
        Ok(())
    }

    #[cfg(test)]
    fn injected_failure(&self, kind: TokenKind) -> Result<(), TokenStoreError> {
        if *self.failing.lock().unwrap_or_else(PoisonError::into_inner) == Some(kind) {
            return Err(TokenStoreError::write(kind, "injected failure"));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn fail_writes_of(&self, kind: Option<TokenKind>) {
        *self.failing.lock().unwrap_or_else(PoisonError::into_inner) = kind;
    }

    /// Pretend the current access token was minted `by` earlier.
    #[cfg(test)]
    pub(crate) fn age_access_token(&self, user_name: &str, by: chrono::Duration) {
        if let Some(record) = self.records().get_mut(user_name) {
            record.access_created_at = record.access_created_at.map(|t| t - by);
        }
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn set_refresh_token(
        &self,
        user_name: &str,
        token: &str,
    ) -> Result<(), TokenStoreError> {
        self.upsert(TokenKind::Refresh, user_name, token)
    }

    async fn set_access_token(&self, user_name: &str, token: &str) -> Result<(), TokenStoreError> {
        self.upsert(TokenKind::Access, user_name, token)
    }

    async fn set_pre_access_token(
        &self,
        user_name: &str,
        token: &str,
    ) -> Result<(), TokenStoreError> {
        self.upsert(TokenKind::PreAccess, user_name, token)
    }

    async fn get_token_info(&self, user_name: &str) -> Result<TokenRecord, TokenStoreError> {
        self.records()
            .get(user_name)
            .cloned()
            .ok_or(TokenStoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_write_creates_the_row() {
        let store = MemoryTokenStore::new();
        assert!(matches!(
            store.get_token_info("alice").await,
            Err(TokenStoreError::NotFound)
        ));

        store.set_pre_access_token("alice", "p").await.unwrap();
        let record = store.get_token_info("alice").await.unwrap();
        assert_eq!(record.pre_access_token, "p");
        assert_eq!(record.access_token, "");
        assert!(record.access_created_at.is_some());
    }

    #[tokio::test]
    async fn access_write_restamps_creation_time() {
        let store = MemoryTokenStore::new();
        store.set_access_token("alice", "a1").await.unwrap();
        store.age_access_token("alice", chrono::Duration::hours(1));
        let aged = store.get_token_info("alice").await.unwrap();

        store.set_access_token("alice", "a2").await.unwrap();
        let fresh = store.get_token_info("alice").await.unwrap();

        assert_eq!(fresh.access_token, "a2");
        assert!(fresh.access_created_at > aged.access_created_at);
    }
}
