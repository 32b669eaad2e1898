use chrono::{DateTime, Utc};
use std::fmt;

/// Time-ordered token identifier.
///
/// ```text
/// 63                     20     15               0
/// +-----------------------+------+---------------+
/// | unix millis (44 bits) | node | counter       |
/// +-----------------------+------+---------------+
/// ```
///
/// The counter wraps after 1024, so two identifiers minted in the same
/// millisecond on the same node only collide after 1025 calls. That is
/// treated as roughly unique, not as a hard guarantee.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct TokenId(pub u64);

impl TokenId {
    pub const NODE_BITS: u32 = 5;
    pub const COUNTER_BITS: u32 = 15;
    pub const MAX_NODE: u64 = (1 << Self::NODE_BITS) - 1;
    pub const MAX_COUNTER: u64 = 1024;

    pub fn compose(millis: u64, node: u64, counter: u64) -> Self {
        let node = node & Self::MAX_NODE;
        let counter = counter & ((1 << Self::COUNTER_BITS) - 1);
        TokenId(
            (millis << (Self::NODE_BITS + Self::COUNTER_BITS))
                | (node << Self::COUNTER_BITS)
                | counter,
        )
    }

    pub fn millis(&self) -> u64 {
        self.0 >> (Self::NODE_BITS + Self::COUNTER_BITS)
    }

    pub fn node(&self) -> u64 {
        (self.0 >> Self::COUNTER_BITS) & Self::MAX_NODE
    }

    pub fn counter(&self) -> u64 {
        self.0 & ((1 << Self::COUNTER_BITS) - 1)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum TokenKind {
    Refresh,
    Access,
    PreAccess,
    Session,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Refresh => "refresh_token",
            TokenKind::Access => "access_token",
            TokenKind::PreAccess => "pre_access_token",
            TokenKind::Session => "session",
        }
    }

    /// Key used by external caches, e.g. `access_token@alice`.
    pub fn key_for(&self, user_name: &str) -> String {
        format!("{}@{}", self.as_str(), user_name)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the backend knows about one user's tokens.
///
/// Creation timestamps are only present when the backend stamps them
/// itself (the durable store). A `None` means the backend enforces expiry
/// natively and the values it hands back are already live.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TokenRecord {
    pub user_name: String,
    pub refresh_token: String,
    pub refresh_created_at: Option<DateTime<Utc>>,
    pub access_token: String,
    pub access_created_at: Option<DateTime<Utc>>,
    pub pre_access_token: String,
}

/// A value mirrored into an in-process cache.
///
/// `Cleared` is a present entry that must fail validation, as opposed to an
/// absent entry which sends the caller to the backend.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CachedToken {
    Known(String),
    Cleared,
}

impl CachedToken {
    pub fn matches(&self, presented: &str) -> bool {
        match self {
            CachedToken::Known(token) => !token.is_empty() && token == presented,
            CachedToken::Cleared => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_id_fields_survive_composition() {
        let id = TokenId::compose(1_700_000_000_123, 7, 1024);
        assert_eq!(id.millis(), 1_700_000_000_123);
        assert_eq!(id.node(), 7);
        assert_eq!(id.counter(), 1024);
    }

    #[test]
    fn node_is_masked_to_five_bits() {
        let id = TokenId::compose(1, 33, 0);
        assert_eq!(id.node(), 1);
        assert_eq!(id.millis(), 1);
    }

    #[test]
    fn later_millis_order_after_larger_counters() {
        let earlier = TokenId::compose(1000, 3, 1024);
        let later = TokenId::compose(1001, 0, 0);
        assert!(later > earlier);
    }

    #[test]
    fn external_keys_are_namespaced_by_kind() {
        assert_eq!(TokenKind::Refresh.key_for("alice"), "refresh_token@alice");
        assert_eq!(TokenKind::Access.key_for("alice"), "access_token@alice");
        assert_eq!(TokenKind::PreAccess.key_for("alice"), "pre_access_token@alice");
        assert_eq!(TokenKind::Session.key_for("alice"), "session@alice");
    }

    #[test]
    fn cleared_and_blank_entries_never_match() {
        assert!(!CachedToken::Cleared.matches(""));
        assert!(!CachedToken::Known(String::new()).matches(""));
        assert!(CachedToken::Known("abc".into()).matches("abc"));
    }
}
