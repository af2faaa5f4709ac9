//! Local storage: a flat string key/value space.
//!
//! RULE: Only the state store and the trend tracker write here.
//! Everything stored is a JSON string; callers own the encoding.
//!
//! Two backends:
//!   - `MemoryStorage`: in-process map, used by tests and the runner's
//!     default mode.
//!   - `SqliteStorage`: file or in-memory SQLite database.
//! Both enforce an optional byte quota (sum of key + value lengths) so
//! that quota-exceeded recovery can be exercised.

mod sqlite;

pub use sqlite::SqliteStorage;

use crate::error::StorageError;
use std::collections::BTreeMap;

pub trait LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;

    /// All keys, in ascending order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Bytes an entry occupies against the quota.
pub(crate) fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

/// Quota check shared by both backends. `used` excludes the entry being
/// replaced.
pub(crate) fn check_quota(
    quota: Option<usize>,
    used: usize,
    key: &str,
    value: &str,
) -> Result<(), StorageError> {
    let Some(quota) = quota else {
        return Ok(());
    };
    let needed = entry_size(key, value);
    let available = quota.saturating_sub(used);
    if needed > available {
        return Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            needed,
            available,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items:       BTreeMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items:       BTreeMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.items.iter().map(|(k, v)| entry_size(k, v)).sum()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let used = self.used_bytes()
            - self.items.get(key).map(|v| entry_size(key, v)).unwrap_or(0);
        check_quota(self.quota_bytes, used, key, value)?;
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_counts_keys_and_values() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.set_item("ab", "cdef").unwrap(); // 6 bytes
        let err = storage.set_item("gh", "ijk").unwrap_err(); // 5 more
        assert!(matches!(err, StorageError::QuotaExceeded { needed: 5, available: 4, .. }));
    }

    #[test]
    fn replacing_a_key_frees_its_old_size() {
        let mut storage = MemoryStorage::with_quota(10);
        storage.set_item("ab", "cdefgh").unwrap(); // 8 bytes
        storage.set_item("ab", "12345678").unwrap(); // 10 bytes, replaces
        assert_eq!(storage.used_bytes(), 10);
    }
}
