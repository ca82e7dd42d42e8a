//! Storage providers for session state.
//!
//! The client persists two values across process restarts: the identity
//! granted by the wallet and the app key used for pairing. Providers only
//! implement a narrow key/value contract; nothing in the connection core
//! depends on a particular persistence technology.

mod file;

pub use file::FileStorage;

use dashmap::DashMap;

use crate::error::Result;

/// Storage key for the cached identity document.
pub const KEY_IDENTITY: &str = "identity";
/// Storage key for the pairing app key.
pub const KEY_APPKEY: &str = "appkey";

/// Narrow key/value contract used to persist session state.
pub trait StorageProvider: Send + Sync {
    /// Load the value stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory storage, dropped with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageProvider for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
