//! Persisted state snapshot: the safelisted subset of the state store,
//! serialized as one JSON blob under `StorageConfig::state_key`.
//!
//! Only keys in `PERSISTED_KEYS` ever reach storage. Transient UI keys
//! (current view, modals, toasts, loading flags) are rebuilt each session.

use crate::{error::StorageError, state::keys};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const SNAPSHOT_VERSION: u32 = 1;

pub const PERSISTED_KEYS: [&str; 4] = [
    keys::IS_AUTHENTICATED,
    keys::CURRENT_USER,
    keys::REFERRAL_FILTERS,
    keys::POINTS_TREND,
];

pub fn is_persisted(key: &str) -> bool {
    PERSISTED_KEYS.contains(&key)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    pub version: u32,
    pub entries: BTreeMap<String, Value>,
}

impl PersistedState {
    /// Capture the safelisted keys present in `state`.
    pub fn capture(state: &BTreeMap<String, Value>) -> Self {
        let entries = state
            .iter()
            .filter(|(k, _)| is_persisted(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            version: SNAPSHOT_VERSION,
            entries,
        }
    }

    /// Parse a stored blob. Anything unreadable, or written by another
    /// snapshot version, is reported as corrupt.
    pub fn from_json(key: &str, json: &str) -> Result<Self, StorageError> {
        let parsed: PersistedState =
            serde_json::from_str(json).map_err(|e| StorageError::Corrupt {
                key:    key.to_string(),
                reason: e.to_string(),
            })?;
        if parsed.version != SNAPSHOT_VERSION {
            return Err(StorageError::Corrupt {
                key:    key.to_string(),
                reason: format!("snapshot version {} (expected {SNAPSHOT_VERSION})", parsed.version),
            });
        }
        Ok(parsed)
    }

    /// Overlay the safelisted entries onto `state`. Unknown keys are ignored.
    pub fn restore_into(self, state: &mut BTreeMap<String, Value>) {
        for (k, v) in self.entries {
            if is_persisted(&k) {
                state.insert(k, v);
            }
        }
    }
}
