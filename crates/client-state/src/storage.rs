//! Key/value blob storage backing the client stores.

use market_core::MarketError;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const APP_DIR: &str = "stock-pulse";

/// Durable string blobs addressed by key.
///
/// Readers must never observe a partially written value.
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, MarketError>;
    fn save(&self, key: &str, value: &str) -> Result<(), MarketError>;
    fn remove(&self, key: &str) -> Result<(), MarketError>;
}

/// One file per key under a state directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory, or `./.stock-pulse` when there is none.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, MarketError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(MarketError::Storage(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, MarketError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MarketError::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Write to a sibling temp file, then rename over the target.
    fn save(&self, key: &str, value: &str) -> Result<(), MarketError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| {
            MarketError::Storage(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .map_err(|e| MarketError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            MarketError::Storage(format!("Failed to replace {}: {}", path.display(), e))
        })
    }

    fn remove(&self, key: &str) -> Result<(), MarketError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MarketError::Storage(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// In-process store, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one value.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, MarketError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| MarketError::Storage("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), MarketError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| MarketError::Storage("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MarketError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| MarketError::Storage("memory store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state"));

        assert_eq!(store.load("watchlist").unwrap(), None);
        store.save("watchlist", "[]").unwrap();
        assert_eq!(store.load("watchlist").unwrap().as_deref(), Some("[]"));

        store.save("watchlist", "[1]").unwrap();
        assert_eq!(store.load("watchlist").unwrap().as_deref(), Some("[1]"));
        assert!(!dir.path().join("state").join("watchlist.json.tmp").exists());

        store.remove("watchlist").unwrap();
        assert_eq!(store.load("watchlist").unwrap(), None);
        // removing twice is fine
        store.remove("watchlist").unwrap();
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(
            store.save("../escape", "x"),
            Err(MarketError::Storage(_))
        ));
        assert!(store.load("").is_err());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::with_entry("theme", "dark");
        assert_eq!(store.load("theme").unwrap().as_deref(), Some("dark"));
        store.save("theme", "light").unwrap();
        assert_eq!(store.load("theme").unwrap().as_deref(), Some("light"));
        store.remove("theme").unwrap();
        assert_eq!(store.load("theme").unwrap(), None);
    }
}
