//! SQLite-backed local storage.

use super::{check_quota, entry_size, LocalStorage};
use crate::error::{DeskResult, StorageError};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SqliteStorage {
    conn:        Connection,
    quota_bytes: Option<usize>,
}

impl SqliteStorage {
    /// Open (or create) the storage database at `path`.
    pub fn open(path: &str) -> DeskResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        let storage = Self {
            conn,
            quota_bytes: None,
        };
        storage.migrate()?;
        Ok(storage)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn,
            quota_bytes: None,
        };
        storage.migrate()?;
        Ok(storage)
    }

    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    fn migrate(&self) -> DeskResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_local_storage.sql"))?;
        Ok(())
    }

    fn used_bytes_excluding(&self, key: &str) -> Result<usize, StorageError> {
        let used: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(item_key AS BLOB)) + LENGTH(CAST(item_value AS BLOB))), 0)
             FROM local_storage WHERE item_key != ?1",
            params![key],
            |row| row.get(0),
        )?;
        Ok(used.max(0) as usize)
    }
}

impl LocalStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT item_value FROM local_storage WHERE item_key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.quota_bytes.is_some() {
            let used = self.used_bytes_excluding(key)?;
            check_quota(self.quota_bytes, used, key, value)?;
        }
        self.conn.execute(
            "INSERT INTO local_storage (item_key, item_value) VALUES (?1, ?2)
             ON CONFLICT(item_key) DO UPDATE SET item_value = excluded.item_value",
            params![key, value],
        )?;
        log::debug!("storage write '{key}' ({} bytes)", entry_size(key, value));
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "DELETE FROM local_storage WHERE item_key = ?1",
            params![key],
        )?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT item_key FROM local_storage ORDER BY item_key ASC")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_and_overwrites() {
        let mut storage = SqliteStorage::in_memory().expect("in-memory storage");
        storage.set_item("k", "v1").unwrap();
        storage.set_item("k", "v2").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v2"));
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn enforces_quota() {
        let mut storage = SqliteStorage::in_memory()
            .expect("in-memory storage")
            .with_quota(Some(8));
        storage.set_item("a", "1234").unwrap();
        assert!(matches!(
            storage.set_item("b", "5678"),
            Err(StorageError::QuotaExceeded { .. })
        ));
        assert_eq!(storage.keys().unwrap(), vec!["a".to_string()]);
    }
}
