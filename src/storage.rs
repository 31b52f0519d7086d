//! Key-value persistence for the planner.
//!
//! The store never touches files directly. It reads and writes whole serialized
//! values through a [`KeyValueStore`], one key per concern.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::StorageError;

/// Key holding the JSON array of tasks.
pub const TASKS_KEY: &str = "campusTasks";
/// Key holding the JSON settings object.
pub const SETTINGS_KEY: &str = "campusSettings";
/// Key holding the dark-mode flag as `"true"`/`"false"`.
pub const THEME_KEY: &str = "darkMode";

/// String-valued key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Last modification stamp of a key, when the backend can tell. Used to
    /// notice writes made by another process.
    fn modified(&self, _key: &str) -> Option<SystemTime> {
        None
    }
}

/// In-memory backend.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without going through a store (tests, fixtures).
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory backend: each key is stored as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    /// Atomic-ish write via temp + rename.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StorageError::Io { path: tmp.clone(), source };

        let mut f = File::create(&tmp).map_err(io_err)?;
        f.write_all(value.as_bytes()).map_err(io_err)?;
        f.flush().map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io { path, source })?;
        Ok(())
    }

    fn modified(&self, key: &str) -> Option<SystemTime> {
        fs::metadata(self.path_for(key)).and_then(|m| m.modified()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get(TASKS_KEY).unwrap(), None);
        store.set(TASKS_KEY, "[]").unwrap();
        assert_eq!(store.get(TASKS_KEY).unwrap().as_deref(), Some("[]"));
        assert!(store.modified(TASKS_KEY).is_none());
    }

    #[test]
    fn test_file_store_writes_one_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(&dir.path().join("data")).unwrap();

        assert_eq!(store.get(THEME_KEY).unwrap(), None);
        assert!(store.modified(THEME_KEY).is_none());

        store.set(THEME_KEY, "true").unwrap();
        store.set(SETTINGS_KEY, "{}").unwrap();

        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("true"));
        assert!(store.path_for(THEME_KEY).exists());
        assert!(!store.path_for(THEME_KEY).with_extension("json.tmp").exists());
        assert!(store.modified(THEME_KEY).is_some());
    }

    #[test]
    fn test_file_store_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.set(TASKS_KEY, "[1]").unwrap();
        store.set(TASKS_KEY, "[2]").unwrap();
        assert_eq!(store.get(TASKS_KEY).unwrap().as_deref(), Some("[2]"));
    }
}
