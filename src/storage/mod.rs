//! Durable key-value storage for the session slots.
//!
//! Two string slots are used: `token` (raw string) and `user` (serialized JSON).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::errors::StorageError;

/// Slot holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";
/// Slot holding the serialized `UserSummary`.
pub const USER_KEY: &str = "user";

/// String-keyed durable storage, read once at startup and written on every session mutation.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object on disk, rewritten on every mutation.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    slots: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the file at `path`, creating parent directories as needed.
    ///
    /// A missing file is an empty store. A file that does not parse is treated as
    /// empty too, so a corrupt cache can never prevent startup.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let slots = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable session file {:?}: {}", path, e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            slots: Mutex::new(slots),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, slots: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(slots)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(key.to_string(), value.to_string());
        self.flush(&slots)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.remove(key).is_some() {
            self.flush(&slots)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_storage_slots() {
        let storage = MemoryStorage::new();
        storage.set(TOKEN_KEY, "abc").unwrap();
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));
        storage.remove(TOKEN_KEY).unwrap();
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("session.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set(TOKEN_KEY, "jwt-1").unwrap();
        storage.set(USER_KEY, r#"{"id":1}"#).unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("jwt-1"));
        assert_eq!(reopened.get(USER_KEY).unwrap().as_deref(), Some(r#"{"id":1}"#));
    }

    #[test]
    fn test_corrupt_file_opens_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    }
}
