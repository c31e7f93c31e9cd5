//! In-memory registry of pending SRP challenges.
//!
//! A challenge is inserted by the challenge handler and removed exactly once:
//! either by `take` (which the verify handler calls *before* any cryptographic
//! check, so a challenge never admits a second verification attempt) or by the
//! janitor's sweep after the TTL.

use anyhow::{Result, bail};
use num_bigint::BigUint;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Everything the verify step needs, parked between the two protocol phases.
pub(super) struct PendingChallenge {
    pub(super) session_id: Uuid,
    pub(super) username: String,
    pub(super) client_a: BigUint,
    pub(super) server_secret: BigUint,
    pub(super) server_b: BigUint,
    pub(super) salt: Vec<u8>,
    pub(super) verifier: BigUint,
    pub(super) created_at: Instant,
}

impl PendingChallenge {
    pub(super) fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

pub(super) struct ChallengeRegistry {
    ttl: Duration,
    entries: Mutex<HashMap<Uuid, PendingChallenge>>,
}

impl ChallengeRegistry {
    pub(super) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(super) fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Park a challenge under its session id.
    ///
    /// Ids are fresh UUIDs; a collision with a live entry means id generation
    /// is broken and the exchange must not proceed.
    pub(super) async fn insert(&self, challenge: PendingChallenge) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| !entry.is_expired(self.ttl));
        match entries.entry(challenge.session_id) {
            Entry::Occupied(_) => {
                bail!("challenge collision for session {}", challenge.session_id)
            }
            Entry::Vacant(slot) => {
                slot.insert(challenge);
                Ok(())
            }
        }
    }

    /// Atomically remove and return the challenge for `session_id`.
    ///
    /// Expired entries are still returned; the caller distinguishes "expired"
    /// from "unknown" for its error reporting.
    pub(super) async fn take(&self, session_id: Uuid) -> Option<PendingChallenge> {
        self.entries.lock().await.remove(&session_id)
    }

    /// Drop entries past the TTL; returns how many were removed.
    pub(super) async fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl));
        before - entries.len()
    }

    #[cfg(test)]
    pub(super) async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn pending(session_id: Uuid) -> PendingChallenge {
        PendingChallenge {
            session_id,
            username: "alice".to_string(),
            client_a: BigUint::from(7u32),
            server_secret: BigUint::from(11u32),
            server_b: BigUint::from(13u32),
            salt: vec![1, 2, 3],
            verifier: BigUint::from(17u32),
            created_at: Instant::now(),
        }
    }

    #[tokio::test]
    async fn take_returns_the_inserted_challenge_once() -> Result<()> {
        let registry = ChallengeRegistry::new(Duration::from_secs(300));
        let id = Uuid::new_v4();
        registry.insert(pending(id)).await?;

        let first = registry.take(id).await;
        assert!(first.is_some());
        assert!(registry.take(id).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn take_is_exactly_once_across_tasks() -> Result<()> {
        let registry = Arc::new(ChallengeRegistry::new(Duration::from_secs(300)));
        let id = Uuid::new_v4();
        registry.insert(pending(id)).await?;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.take(id).await.is_some()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await? {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        Ok(())
    }

    #[tokio::test]
    async fn insert_rejects_live_duplicates() -> Result<()> {
        let registry = ChallengeRegistry::new(Duration::from_secs(300));
        let id = Uuid::new_v4();
        registry.insert(pending(id)).await?;
        assert!(registry.insert(pending(id)).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn sweep_removes_expired_entries() -> Result<()> {
        let registry = ChallengeRegistry::new(Duration::ZERO);
        let id = Uuid::new_v4();
        registry.insert(pending(id)).await?;

        // With a zero TTL the entry is immediately past its lifetime.
        let removed = registry.sweep().await;
        assert_eq!(removed, 1);
        assert_eq!(registry.len().await, 0);
        assert!(registry.take(id).await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn take_returns_expired_entries_for_error_reporting() -> Result<()> {
        let registry = ChallengeRegistry::new(Duration::ZERO);
        let id = Uuid::new_v4();

        // Insert would retain-away an expired sibling, not the fresh insert itself.
        registry.insert(pending(id)).await?;
        let challenge = registry.take(id).await;
        match challenge {
            Some(challenge) => assert!(challenge.is_expired(registry.ttl())),
            None => bail!("expected the expired challenge to be returned"),
        }
        Ok(())
    }
}
