//! Key-value persistence for the conversation snapshot

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Key the conversation snapshot is stored under
pub const SESSION_KEY: &str = "kisan-chat-history";

/// Flat string store keyed by string
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store, lost when dropped
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// One file per key inside a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            || key.starts_with('.')
        {
            return Err(Error::Persistence(format!("invalid key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        // Write then rename so a crash never leaves half a snapshot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("kisan-store-{}-{}", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get(SESSION_KEY).unwrap(), None);
        store.set(SESSION_KEY, "[]").unwrap();
        assert_eq!(store.get(SESSION_KEY).unwrap().as_deref(), Some("[]"));
        store.remove(SESSION_KEY).unwrap();
        assert_eq!(store.get(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = temp_dir("round-trip");
        let store = FileStore::open(&dir).unwrap();
        store.set(SESSION_KEY, r#"[{"a":1}]"#).unwrap();
        assert!(dir.join("kisan-chat-history.json").exists());

        let reopened = FileStore::open(&dir).unwrap();
        assert_eq!(
            reopened.get(SESSION_KEY).unwrap().as_deref(),
            Some(r#"[{"a":1}]"#)
        );

        reopened.remove(SESSION_KEY).unwrap();
        assert_eq!(reopened.get(SESSION_KEY).unwrap(), None);
        // Removing twice is fine
        reopened.remove(SESSION_KEY).unwrap();

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = temp_dir("keys");
        let store = FileStore::open(&dir).unwrap();
        assert!(store.set("../escape", "x").is_err());
        assert!(store.set("", "x").is_err());
        assert!(store.get("a/b").is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
