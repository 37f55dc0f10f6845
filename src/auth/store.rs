//! Revocation store: server-side liveness oracle for issued credentials.
//!
//! The [`RevocationStore`] trait abstracts over key/value backends with
//! per-key expiry. An entry `credential ID → subject ID` exists exactly as
//! long as the credential is considered live; deleting it revokes the
//! credential before its signed expiry.
//!
//! Two implementations ship: [`InMemoryRevocationStore`] (a `DashMap` with
//! lazy eviction plus a background reaper) and
//! [`RedisRevocationStore`](super::redis_store::RedisRevocationStore).

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use super::claims::SubjectId;
use super::error::StoreError;

/// Key/value backend mapping credential IDs to subject IDs.
///
/// Implementations must be `Send + Sync` because one store is shared by
/// every in-flight request. A completed `save` must be visible to all
/// subsequent `load` calls; atomicity is the backend's job.
#[async_trait::async_trait]
pub trait RevocationStore: Send + Sync + 'static {
    /// Create or overwrite the entry, expiring `ttl` from now.
    async fn save(&self, credential_id: &str, subject: SubjectId, ttl: Duration) -> Result<(), StoreError>;

    /// Look up a live entry.
    ///
    /// Returns [`StoreError::NotFound`] if the entry is absent or expired.
    async fn load(&self, credential_id: &str) -> Result<SubjectId, StoreError>;
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    subject: SubjectId,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory revocation store backed by a `DashMap`.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    entries: DashMap<String, Entry>,
}

impl InMemoryRevocationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete an entry, revoking the credential immediately.
    ///
    /// Returns `true` if a live entry was removed.
    pub fn remove(&self, credential_id: &str) -> bool {
        self.entries
            .remove(credential_id)
            .is_some_and(|(_, entry)| !entry.is_expired())
    }

    /// Number of stored entries, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove `credential_id` only if its current entry is expired, so a
    /// concurrent `save` that replaced it is never lost.
    fn evict_if_expired(&self, credential_id: &str) -> bool {
        self.entries
            .remove_if(credential_id, |_, entry| entry.is_expired())
            .is_some()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn reap_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait::async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn save(&self, credential_id: &str, subject: SubjectId, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| StoreError::Backend(format!("ttl out of range: {ttl:?}")))?;
        self.entries
            .insert(credential_id.to_string(), Entry { subject, expires_at });
        Ok(())
    }

    async fn load(&self, credential_id: &str) -> Result<SubjectId, StoreError> {
        let entry = self
            .entries
            .get(credential_id)
            .map(|e| *e.value())
            .ok_or_else(|| StoreError::NotFound(credential_id.to_string()))?;

        if entry.is_expired() {
            if self.evict_if_expired(credential_id) {
                debug!(jti = %credential_id, "Lazy-evicted expired revocation entry");
            }
            return Err(StoreError::NotFound(credential_id.to_string()));
        }

        Ok(entry.subject)
    }
}

/// Spawn a background task that reaps expired entries every `interval`.
///
/// The task exits when the `shutdown` receiver fires.
pub fn spawn_reaper(
    store: Arc<InMemoryRevocationStore>,
    interval: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let reaped = store.reap_expired();
                    if reaped > 0 {
                        debug!(count = reaped, "Reaped expired revocation entries");
                    }
                }
                _ = shutdown.recv() => {
                    debug!("Revocation reaper shutting down");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(30 * 60);

    #[tokio::test]
    async fn save_then_load_returns_subject() {
        // GIVEN: a store with one entry
        let store = InMemoryRevocationStore::new();
        store.save("jti-1", SubjectId(7), TTL).await.unwrap();

        // WHEN/THEN: load returns the subject
        assert_eq!(store.load("jti-1").await.unwrap(), SubjectId(7));
    }

    #[tokio::test]
    async fn load_unknown_is_not_found() {
        let store = InMemoryRevocationStore::new();
        let err = store.load("missing").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn save_overwrites_existing_entry() {
        let store = InMemoryRevocationStore::new();
        store.save("jti-1", SubjectId(1), TTL).await.unwrap();
        store.save("jti-1", SubjectId(2), TTL).await.unwrap();

        assert_eq!(store.load("jti-1").await.unwrap(), SubjectId(2));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn load_lazy_evicts_expired_entry() {
        // GIVEN: an entry with zero ttl (already expired)
        let store = InMemoryRevocationStore::new();
        store.save("jti-1", SubjectId(7), Duration::ZERO).await.unwrap();

        // WHEN: we load it
        let result = store.load("jti-1").await;

        // THEN: it is gone
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn eviction_spares_entry_resaved_after_expiry_was_seen() {
        // GIVEN: a reader has seen "jti-1" expired
        let store = InMemoryRevocationStore::new();
        store.save("jti-1", SubjectId(7), Duration::ZERO).await.unwrap();
        assert!(store.entries.get("jti-1").is_some_and(|e| e.is_expired()));

        // WHEN: a save replaces it before the reader evicts
        store.save("jti-1", SubjectId(8), TTL).await.unwrap();
        let evicted = store.evict_if_expired("jti-1");

        // THEN: the fresh entry survives
        assert!(!evicted);
        assert_eq!(store.load("jti-1").await.unwrap(), SubjectId(8));
    }

    #[tokio::test]
    async fn remove_revokes_entry() {
        let store = InMemoryRevocationStore::new();
        store.save("jti-1", SubjectId(7), TTL).await.unwrap();

        assert!(store.remove("jti-1"));
        assert!(!store.remove("jti-1"));
        assert!(store.load("jti-1").await.is_err());
    }

    #[tokio::test]
    async fn reap_expired_removes_only_expired() {
        let store = InMemoryRevocationStore::new();
        store.save("live", SubjectId(1), TTL).await.unwrap();
        store.save("dead-1", SubjectId(2), Duration::ZERO).await.unwrap();
        store.save("dead-2", SubjectId(3), Duration::ZERO).await.unwrap();

        assert_eq!(store.reap_expired(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.load("live").await.is_ok());
    }

    #[tokio::test]
    async fn reaper_stops_on_shutdown() {
        let store = Arc::new(InMemoryRevocationStore::new());
        let (tx, rx) = tokio::sync::broadcast::channel(1);
        let handle = spawn_reaper(Arc::clone(&store), Duration::from_millis(10), rx);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reaper did not stop")
            .unwrap();
    }
}
