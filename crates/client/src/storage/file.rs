//! File-backed storage provider.
//!
//! Session state is kept as a single JSON object mapping keys to string
//! values, stored under the platform-local data directory by default. Every
//! operation reads and rewrites the whole document; the values involved are
//! a short identity record and an app key, so the document stays tiny.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScatterError};
use crate::storage::StorageProvider;

/// Directory name under the platform data dir.
const DATA_DIR: &str = "scatter";
/// File name of the session document.
const SESSION_FILE: &str = "session.json";

/// Key/value storage persisted as a JSON file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create a store at the default platform location, e.g.
    /// `~/.local/share/scatter/session.json` on Linux.
    pub fn new() -> Self {
        let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join(DATA_DIR).join(SESSION_FILE),
        }
    }

    /// Create a store at an explicit path.
    pub fn at_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the session document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let text = fs::read_to_string(&self.path)?;
        serde_json::from_str(&text).map_err(|e| {
            ScatterError::Storage(format!(
                "corrupt session document at {}: {e}",
                self.path.display()
            ))
        })
    }

    fn write_document(&self, document: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(document)
            .map_err(|e| ScatterError::Storage(e.to_string()))?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageProvider for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_document()?.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut document = self.read_document()?;
        document.insert(key.to_string(), value.to_string());
        self.write_document(&document)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut document = self.read_document()?;
        if document.remove(key).is_some() {
            self.write_document(&document)?;
        }
        Ok(())
    }
}
