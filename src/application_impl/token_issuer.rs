use crate::application_port::TokenIssuer;
use crate::domain_model::TokenId;
use anyhow::anyhow;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::{Mutex, PoisonError};

/// Mints [`TokenId`]s for one node. The clock read and the counter bump
/// happen under the same lock, so concurrent callers never share a slot.
pub struct IdGenerator {
    node: u64,
    counter: Mutex<u64>,
}

impl IdGenerator {
    pub fn new(node: u16) -> anyhow::Result<Self> {
        if u64::from(node) > TokenId::MAX_NODE {
            return Err(anyhow!(
                "node identity {} out of range 0..={}",
                node,
                TokenId::MAX_NODE
            ));
        }
        Ok(Self {
            node: u64::from(node),
            counter: Mutex::new(0),
        })
    }

    pub fn next(&self) -> TokenId {
        let mut counter = self.counter.lock().unwrap_or_else(PoisonError::into_inner);
        *counter += 1;
        if *counter > TokenId::MAX_COUNTER {
            *counter = 0;
        }
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        TokenId::compose(millis, self.node, *counter)
    }
}

/// Tokens are the SHA-256 of the identifier's decimal form, lowercase hex.
pub struct Sha256TokenIssuer {
    ids: IdGenerator,
}

impl Sha256TokenIssuer {
    pub fn new(node: u16) -> anyhow::Result<Self> {
        Ok(Self {
            ids: IdGenerator::new(node)?,
        })
    }

    fn digest_hex(id: TokenId) -> String {
        hex::encode(Sha256::digest(id.to_string().as_bytes()))
    }
}

impl TokenIssuer for Sha256TokenIssuer {
    fn next_identifier(&self) -> TokenId {
        self.ids.next()
    }

    fn new_token(&self) -> String {
        Self::digest_hex(self.ids.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn node_identity_is_bounded() {
        assert!(IdGenerator::new(31).is_ok());
        assert!(IdGenerator::new(32).is_err());
    }

    #[test]
    fn identifiers_carry_node_and_increase() {
        let ids = IdGenerator::new(9).unwrap();
        let first = ids.next();
        let second = ids.next();
        assert_eq!(first.node(), 9);
        assert_eq!(first.counter(), 1);
        assert_eq!(second.counter(), 2);
        assert!(second > first);
    }

    #[test]
    fn counter_wraps_after_1024() {
        let ids = IdGenerator::new(0).unwrap();
        let mut last = TokenId(0);
        for _ in 0..1025 {
            last = ids.next();
        }
        assert_eq!(last.counter(), 0);
        assert!(ids.next().counter() == 1);
    }

    #[test]
    fn tokens_are_lowercase_sha256_hex() {
        let issuer = Sha256TokenIssuer::new(1).unwrap();
        let token = issuer.new_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_ne!(token, issuer.new_token());
    }

    #[test]
    fn digest_matches_decimal_rendering() {
        // sha256("0")
        assert_eq!(
            Sha256TokenIssuer::digest_hex(TokenId(0)),
            "5feceb66ffc86f38d952786c6d696c79c2dbc239dd4e91b46729d73a27fb57e9"
        );
    }

    #[test]
    fn concurrent_issuance_yields_distinct_tokens() {
        let issuer = Arc::new(Sha256TokenIssuer::new(2).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let issuer = issuer.clone();
                std::thread::spawn(move || (0..200).map(|_| issuer.new_token()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for token in handle.join().unwrap() {
                assert!(seen.insert(token));
            }
        }
        assert_eq!(seen.len(), 800);
    }
}
