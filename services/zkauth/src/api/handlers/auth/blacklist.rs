//! In-process revocation list for bearer tokens.
//!
//! Revoked tokens are held until their natural expiry, after which the
//! janitor's cleanup drops them; a token past its `exp` claim is rejected by
//! signature validation anyway. Revocations do not propagate across nodes.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

pub(super) struct TokenBlacklist {
    // token -> expiration time; reads dominate, so a RW lock fits.
    tokens: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl TokenBlacklist {
    pub(super) fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    pub(super) async fn revoke(&self, token: String, expires_at: DateTime<Utc>) {
        self.tokens.write().await.insert(token, expires_at);
    }

    pub(super) async fn is_revoked(&self, token: &str) -> bool {
        self.tokens.read().await.contains_key(token)
    }

    /// Drop entries whose expiry has passed; returns how many were removed.
    pub(super) async fn cleanup(&self) -> usize {
        let now = Utc::now();
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, expires_at| *expires_at > now);
        before - tokens.len()
    }
}
