use super::ExpiringStore;
use crate::domain_model::CachedToken;
use crate::domain_port::TokenCache;
use std::time::Duration;

/// Two expiring stores mirroring access and pre-access tokens per user.
pub struct LocalTokenCache {
    access: ExpiringStore<CachedToken>,
    pre_access: ExpiringStore<CachedToken>,
}

impl LocalTokenCache {
    /// Mirror lifetimes never exceed the token policy they shadow.
    pub fn start(
        in_memory_ttl: Duration,
        token_expires_in: Duration,
        pre_token_expire_in: Duration,
    ) -> Self {
        Self {
            access: ExpiringStore::start(in_memory_ttl.min(token_expires_in)),
            pre_access: ExpiringStore::start(in_memory_ttl.min(pre_token_expire_in)),
        }
    }

    pub fn close(&self) {
        self.access.close();
        self.pre_access.close();
    }
}

impl TokenCache for LocalTokenCache {
    fn access(&self, user_name: &str) -> Option<CachedToken> {
        self.access.get(user_name)
    }

    fn pre_access(&self, user_name: &str) -> Option<CachedToken> {
        self.pre_access.get(user_name)
    }

    fn put_access(&self, user_name: &str, token: CachedToken) {
        self.access.set(user_name, token);
    }

    fn put_pre_access(&self, user_name: &str, token: CachedToken) {
        self.pre_access.set(user_name, token);
    }

    fn forget_pre_access(&self, user_name: &str) {
        self.pre_access.delete(user_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn pre_access_mirror_follows_grace_window() {
        let cache = LocalTokenCache::start(
            Duration::from_secs(3600),
            Duration::from_secs(600),
            Duration::from_secs(10),
        );
        cache.put_access("alice", CachedToken::Known("a2".into()));
        cache.put_pre_access("alice", CachedToken::Known("a1".into()));

        sleep(Duration::from_secs(15)).await;
        assert_eq!(cache.pre_access("alice"), None);
        assert_eq!(cache.access("alice"), Some(CachedToken::Known("a2".into())));
        cache.close();
    }

    #[tokio::test]
    async fn mark_cleared_covers_both_mirrors() {
        let cache = LocalTokenCache::start(
            Duration::from_secs(60),
            Duration::from_secs(60),
            Duration::from_secs(60),
        );
        cache.put_access("bob", CachedToken::Known("a".into()));
        cache.mark_cleared("bob");

        assert_eq!(cache.access("bob"), Some(CachedToken::Cleared));
        assert_eq!(cache.pre_access("bob"), Some(CachedToken::Cleared));

        cache.forget_pre_access("bob");
        assert_eq!(cache.pre_access("bob"), None);
    }
}
