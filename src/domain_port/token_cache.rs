use crate::domain_model::CachedToken;

/// In-process mirror of access and pre-access tokens used to answer
/// validation without a backend round trip.
pub trait TokenCache: Send + Sync {
    fn access(&self, user_name: &str) -> Option<CachedToken>;

    fn pre_access(&self, user_name: &str) -> Option<CachedToken>;

    fn put_access(&self, user_name: &str, token: CachedToken);

    fn put_pre_access(&self, user_name: &str, token: CachedToken);

    fn forget_pre_access(&self, user_name: &str);

    /// Mark both mirrors as revoked so the fast path rejects the user.
    fn mark_cleared(&self, user_name: &str) {
        self.put_access(user_name, CachedToken::Cleared);
        self.put_pre_access(user_name, CachedToken::Cleared);
    }
}
