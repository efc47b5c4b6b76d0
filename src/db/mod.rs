//! SQLite key-value backend for basket
//!
//! Stores each collection as a single row so multi-key writes can share a
//! transaction.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::storage::{KeyValueStore, StorageError};

/// SQLite-backed key-value table
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key         TEXT PRIMARY KEY,
                value       TEXT NOT NULL,
                updated_at  INTEGER NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

const UPSERT: &str = r#"
    INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
"#;

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get(0));

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = chrono::Utc::now().timestamp();
        self.conn.execute(UPSERT, params![key, value, now])?;
        Ok(())
    }

    fn put_batch(&mut self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let now = chrono::Utc::now().timestamp();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT)?;
            for (key, value) in entries {
                stmt.execute(params![key, value, now])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ITEMS_KEY, LISTS_KEY};

    #[test]
    fn test_get_missing_key() -> anyhow::Result<()> {
        let store = SqliteStore::open_in_memory()?;
        assert_eq!(store.get(LISTS_KEY)?, None);
        Ok(())
    }

    #[test]
    fn test_put_batch_upserts_every_key() -> anyhow::Result<()> {
        let mut store = SqliteStore::open_in_memory()?;
        store.put(LISTS_KEY, "[]")?;
        store.put_batch(&[
            (LISTS_KEY, "[{}]".to_string()),
            (ITEMS_KEY, "[]".to_string()),
        ])?;

        assert_eq!(store.get(LISTS_KEY)?.as_deref(), Some("[{}]"));
        assert_eq!(store.get(ITEMS_KEY)?.as_deref(), Some("[]"));
        Ok(())
    }
}
