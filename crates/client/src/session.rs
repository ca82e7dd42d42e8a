//! Session cache for the identity granted by the wallet.
//!
//! The cache is a value holder with replace-whole-object semantics: an
//! identity is stored on a successful grant, returned without a round trip
//! while it lives, and dropped on forget. Writes are serialized by the
//! command surface, which issues at most one identity-mutating call at a
//! time. The cache is backed by the storage provider so a granted identity
//! survives process restarts; storage failures are logged and the in-memory
//! state stays authoritative.

use std::sync::Arc;

use scatter_protocol::types::Identity;
use tokio::sync::RwLock;

use crate::storage::{StorageProvider, KEY_IDENTITY};

/// Holds the last identity granted by the wallet.
pub struct SessionCache {
    identity: RwLock<Option<Identity>>,
    storage: Arc<dyn StorageProvider>,
}

impl SessionCache {
    /// Create a cache backed by the given storage provider.
    ///
    /// A previously persisted identity is loaded immediately; an unreadable
    /// or corrupt persisted document reads as absent.
    pub fn new(storage: Arc<dyn StorageProvider>) -> Self {
        let identity = match storage.load(KEY_IDENTITY) {
            Ok(Some(text)) => match serde_json::from_str(&text) {
                Ok(identity) => Some(identity),
                Err(error) => {
                    tracing::warn!(%error, "ignoring corrupt persisted identity");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(%error, "failed to load persisted identity");
                None
            }
        };

        Self {
            identity: RwLock::new(identity),
            storage,
        }
    }

    /// The cached identity, if one has been granted.
    pub async fn get(&self) -> Option<Identity> {
        self.identity.read().await.clone()
    }

    /// Replace the cached identity and persist it.
    pub async fn set(&self, identity: Identity) {
        match serde_json::to_string(&identity) {
            Ok(text) => {
                if let Err(error) = self.storage.save(KEY_IDENTITY, &text) {
                    tracing::warn!(%error, "failed to persist identity");
                }
            }
            Err(error) => tracing::warn!(%error, "failed to serialize identity"),
        }
        *self.identity.write().await = Some(identity);
    }

    /// Drop the cached identity and remove the persisted copy.
    pub async fn clear(&self) {
        if let Err(error) = self.storage.remove(KEY_IDENTITY) {
            tracing::warn!(%error, "failed to remove persisted identity");
        }
        *self.identity.write().await = None;
    }

    /// Whether an identity is currently cached.
    pub async fn is_set(&self) -> bool {
        self.identity.read().await.is_some()
    }
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ScatterError};
    use crate::storage::MemoryStorage;
    use scatter_protocol::types::Account;

    fn sample_identity(name: &str) -> Identity {
        Identity {
            hash: format!("hash-{name}"),
            public_key: "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV".to_string(),
            name: name.to_string(),
            kyc: false,
            accounts: vec![Account {
                name: "myaccount".to_string(),
                authority: "active".to_string(),
                ..Account::default()
            }],
        }
    }

    fn fresh_cache() -> SessionCache {
        SessionCache::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn test_empty_cache_returns_none() {
        let cache = fresh_cache();
        assert!(cache.get().await.is_none());
        assert!(!cache.is_set().await);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = fresh_cache();
        cache.set(sample_identity("alice")).await;

        let identity = cache.get().await.expect("identity should be cached");
        assert_eq!(identity.name, "alice");
        assert_eq!(identity.accounts.len(), 1);
        assert!(cache.is_set().await);
    }

    #[tokio::test]
    async fn test_set_replaces_whole_identity() {
        let cache = fresh_cache();
        cache.set(sample_identity("alice")).await;

        let mut replacement = sample_identity("bob");
        replacement.accounts.clear();
        cache.set(replacement).await;

        let identity = cache.get().await.expect("identity should be cached");
        assert_eq!(identity.name, "bob");
        assert!(identity.accounts.is_empty());
    }

    #[tokio::test]
    async fn test_clear_drops_identity_and_persisted_copy() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = SessionCache::new(storage.clone());
        cache.set(sample_identity("alice")).await;
        assert!(storage.load(KEY_IDENTITY).unwrap().is_some());

        cache.clear().await;
        assert!(cache.get().await.is_none());
        assert!(storage.load(KEY_IDENTITY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_identity_survives_reconstruction() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let cache = SessionCache::new(storage.clone());
            cache.set(sample_identity("alice")).await;
        }

        let cache = SessionCache::new(storage);
        let identity = cache.get().await.expect("identity should be reloaded");
        assert_eq!(identity.name, "alice");
        assert_eq!(identity.hash, "hash-alice");
    }

    #[tokio::test]
    async fn test_corrupt_persisted_identity_reads_as_absent() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(KEY_IDENTITY, "not json").unwrap();

        let cache = SessionCache::new(storage);
        assert!(cache.get().await.is_none());
    }

    /// Storage that fails every operation.
    struct BrokenStorage;

    impl StorageProvider for BrokenStorage {
        fn load(&self, _key: &str) -> Result<Option<String>> {
            Err(ScatterError::Storage("disk on fire".to_string()))
        }
        fn save(&self, _key: &str, _value: &str) -> Result<()> {
            Err(ScatterError::Storage("disk on fire".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(ScatterError::Storage("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn test_storage_failures_do_not_break_the_cache() {
        let cache = SessionCache::new(Arc::new(BrokenStorage));
        assert!(cache.get().await.is_none());

        cache.set(sample_identity("alice")).await;
        assert_eq!(cache.get().await.unwrap().name, "alice");

        cache.clear().await;
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_readers_see_a_full_identity() {
        let cache = Arc::new(fresh_cache());
        cache.set(sample_identity("alice")).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let identity = cache.get().await.expect("identity should be cached");
                assert!(identity.name == "alice" || identity.name == "bob");
                assert_eq!(identity.hash, format!("hash-{}", identity.name));
            }));
        }
        cache.set(sample_identity("bob")).await;

        for handle in handles {
            handle.await.expect("reader task should not panic");
        }
    }
}
