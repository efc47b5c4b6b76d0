// Shared fixtures for integration tests

#![allow(dead_code)]

use std::io;

use basket::models::{NewItem, ShoppingList};
use basket::storage::{KeyValueStore, MemoryStore, StorageError};
use basket::store::ShoppingStore;

pub fn memory_store() -> ShoppingStore<MemoryStore> {
    ShoppingStore::new(MemoryStore::new())
}

/// Create a list with one item per `(name, checked)` pair
pub fn list_with_items<S: KeyValueStore>(
    store: &mut ShoppingStore<S>,
    name: &str,
    items: &[(&str, bool)],
) -> anyhow::Result<ShoppingList> {
    let list = store.create_list(name)?;
    for (item_name, checked) in items {
        store.create_item(NewItem::new(&list.id, *item_name).checked(*checked))?;
    }
    Ok(list)
}

/// Memory backend that fails exactly one `put`, chosen by call number
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub puts: usize,
    pub fail_at: Option<usize>,
}

impl FlakyStore {
    /// Fail the `n`th put from now (1-based)
    pub fn fail_after(&mut self, n: usize) {
        self.fail_at = Some(self.puts + n);
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.puts += 1;
        if self.fail_at == Some(self.puts) {
            return Err(StorageError::Io {
                path: key.into(),
                source: io::Error::new(io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.put(key, value)
    }
}
