//! Key-value backends for basket
//!
//! Each collection is one JSON document stored under its own key. A backend
//! only has to read and replace whole values; everything typed lives in
//! [`crate::store`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Storage key holding the list collection
pub const LISTS_KEY: &str = "shopping_lists";
/// Storage key holding the item collection
pub const ITEMS_KEY: &str = "shopping_items";

/// Backend failure
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Whole-value key-value storage
pub trait KeyValueStore {
    /// Read the raw value under `key`; `None` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`
    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Replace several keys as one unit
    ///
    /// The default writes the entries in order. Backends that can do better
    /// (a transaction, staged files) override it.
    fn put_batch(&mut self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.put(key, value)?;
        }
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).put(key, value)
    }

    fn put_batch(&mut self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        (**self).put_batch(entries)
    }
}

/// In-memory backend, used by tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing any typed validation
    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn staging_path(target: &Path) -> PathBuf {
        target.with_extension("json.tmp")
    }

    fn stage(&self, key: &str, value: &str) -> Result<(PathBuf, PathBuf), StorageError> {
        let target = self.path_for(key)?;
        let staged = Self::staging_path(&target);
        fs::write(&staged, value).map_err(|e| StorageError::io(&staged, e))?;
        Ok((staged, target))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let (staged, target) = self.stage(key, value)?;
        fs::rename(&staged, &target).map_err(|e| StorageError::io(&target, e))
    }

    fn put_batch(&mut self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        // A staging failure leaves every target untouched. A failed rename can
        // leave earlier keys replaced, but no staged file is left behind.
        let mut staged = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match self.stage(key, value) {
                Ok(pair) => staged.push(pair),
                Err(e) => {
                    for (tmp, _) in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    return Err(e);
                }
            }
        }
        let mut renames = staged.iter();
        while let Some((tmp, target)) = renames.next() {
            if let Err(e) = fs::rename(tmp, target) {
                let _ = fs::remove_file(tmp);
                for (rest, _) in renames {
                    let _ = fs::remove_file(rest);
                }
                return Err(StorageError::io(target, e));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get(LISTS_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_put_replaces_value() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut store = FileStore::open(temp.path().join("data"))?;

        assert_eq!(store.get(ITEMS_KEY)?, None);
        store.put(ITEMS_KEY, "[1]")?;
        store.put(ITEMS_KEY, "[1,2]")?;
        assert_eq!(store.get(ITEMS_KEY)?.as_deref(), Some("[1,2]"));
        assert!(!temp.path().join("data/shopping_items.json.tmp").exists());
        Ok(())
    }

    #[test]
    fn test_file_store_batch_rejects_bad_key_without_writing() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut store = FileStore::open(temp.path())?;
        store.put(LISTS_KEY, "[]")?;

        let result = store.put_batch(&[
            (LISTS_KEY, "[\"changed\"]".to_string()),
            ("../escape", "[]".to_string()),
        ]);

        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert_eq!(store.get(LISTS_KEY)?.as_deref(), Some("[]"));
        Ok(())
    }

    #[test]
    fn test_file_store_failed_rename_cleans_up_staged_files() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut store = FileStore::open(temp.path())?;

        // A non-empty directory in the way makes the rename fail
        let blocker = temp.path().join("shopping_items.json");
        fs::create_dir(&blocker)?;
        fs::write(blocker.join("keep"), "x")?;

        let result = store.put_batch(&[
            (ITEMS_KEY, "[]".to_string()),
            (LISTS_KEY, "[]".to_string()),
        ]);

        assert!(matches!(result, Err(StorageError::Io { .. })));
        assert_eq!(store.get(LISTS_KEY)?, None);
        assert!(!temp.path().join("shopping_items.json.tmp").exists());
        assert!(!temp.path().join("shopping_lists.json.tmp").exists());
        Ok(())
    }
}
