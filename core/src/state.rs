//! The state store: one key/value map with per-key subscriptions.
//!
//! RULES:
//!   - `set_state` shallow-merges a patch, then notifies the subscribers
//!     of exactly the keys in that patch, then persists the safelisted
//!     subset (see snapshot.rs).
//!   - Subscribers never call back into the store. They receive a
//!     `StatePatch` they may fill with follow-up updates; follow-ups are
//!     queued and drained in rounds, bounded by `notify_depth_limit`.
//!   - Storage failures never reach the caller. They are logged; a quota
//!     failure evicts the namespace's other keys and retries once.
//!   - There is no global store. Each `StateStore` is an independent
//!     instance owned by its `DeskApp` (or by a test).

use crate::{
    config::{AppConfig, StorageConfig},
    error::StorageError,
    snapshot::{is_persisted, PersistedState},
    stats::ReferralFilters,
    storage::LocalStorage,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};

/// Well-known state keys.
pub mod keys {
    pub const CURRENT_VIEW: &str = "currentView";
    pub const IS_AUTHENTICATED: &str = "isAuthenticated";
    pub const CURRENT_USER: &str = "currentUser";
    pub const REFERRALS: &str = "referrals";
    pub const REFERRAL_FILTERS: &str = "referralFilters";
    pub const SELECTED_REFERRAL: &str = "selectedReferral";
    pub const ACTIVE_MODAL: &str = "activeModal";
    pub const CAMPAIGN_FILTER: &str = "campaignFilter";
    pub const POINTS_TREND: &str = "pointsTrend";
    pub const TOAST: &str = "toast";
    pub const LOADING: &str = "loading";
}

/// An ordered set of key → value updates. A later write to the same key
/// replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    entries: Vec<(String, Value)>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Serialize `value` into the patch. Serialization failures are
    /// logged and the key is skipped.
    pub fn set_serialized<T: Serialize>(mut self, key: &str, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => self.insert(key, v),
            Err(e) => log::error!("state key '{key}' not serializable: {e}"),
        }
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None        => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&Value, &mut StatePatch)>;

struct Subscriber {
    id:       SubscriptionId,
    callback: Callback,
}

pub struct StateStore {
    state:       BTreeMap<String, Value>,
    subscribers: BTreeMap<String, Vec<Subscriber>>,
    next_id:     u64,
    storage:     Box<dyn LocalStorage>,
    storage_cfg: StorageConfig,
    depth_limit: usize,
}

impl StateStore {
    /// Build a store and hydrate it from the persisted snapshot, if any.
    /// A corrupt snapshot is removed and the store starts from defaults.
    pub fn new(storage: Box<dyn LocalStorage>, config: &AppConfig) -> Self {
        let mut store = Self {
            state:       default_state(),
            subscribers: BTreeMap::new(),
            next_id:     1,
            storage,
            storage_cfg: config.storage.clone(),
            depth_limit: config.notify_depth_limit.max(1),
        };
        store.hydrate();
        store
    }

    fn hydrate(&mut self) {
        let key = self.storage_cfg.state_key.clone();
        let raw = match self.storage.get_item(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                log::warn!("state snapshot unreadable, starting fresh: {e}");
                return;
            }
        };
        match PersistedState::from_json(&key, &raw) {
            Ok(snapshot) => {
                log::debug!("hydrated {} persisted key(s)", snapshot.entries.len());
                snapshot.restore_into(&mut self.state);
            }
            Err(e) => {
                log::warn!("{e}; discarding stored snapshot");
                if let Err(e) = self.storage.remove_item(&key) {
                    log::warn!("could not remove corrupt snapshot: {e}");
                }
            }
        }
    }

    // ── Reads ──────────────────────────────────────────────────────

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Typed read. `None` when the key is missing, null, or of another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.state.get(key)?;
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("state key '{key}' has unexpected shape: {e}");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .get(keys::IS_AUTHENTICATED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn current_view(&self) -> Option<&str> {
        self.state.get(keys::CURRENT_VIEW).and_then(Value::as_str)
    }

    // ── Writes ─────────────────────────────────────────────────────

    /// Merge `patch`, notify, persist. Follow-up patches produced by
    /// subscribers are applied in later rounds of the same call.
    pub fn set_state(&mut self, patch: StatePatch) {
        let mut queue: VecDeque<StatePatch> = VecDeque::from([patch]);
        let mut rounds = 0usize;
        let mut touched_persisted = false;

        while let Some(patch) = queue.pop_front() {
            if rounds >= self.depth_limit {
                log::warn!(
                    "notification depth limit ({}) reached; dropping {} queued update(s)",
                    self.depth_limit,
                    queue.len() + 1
                );
                break;
            }
            rounds += 1;

            let changed: Vec<String> = patch.keys().map(str::to_string).collect();
            for (key, value) in patch.entries {
                log::debug!("set {key}");
                self.state.insert(key, value);
            }
            touched_persisted |= changed.iter().any(|k| is_persisted(k));

            for key in &changed {
                let Some(subs) = self.subscribers.get_mut(key) else {
                    continue;
                };
                let value = self.state.get(key).cloned().unwrap_or(Value::Null);
                for sub in subs.iter_mut() {
                    let mut follow_up = StatePatch::new();
                    (sub.callback)(&value, &mut follow_up);
                    if !follow_up.is_empty() {
                        queue.push_back(follow_up);
                    }
                }
            }
        }

        if touched_persisted {
            self.persist();
        }
    }

    /// Register `callback` for changes to `key`.
    pub fn subscribe<F>(&mut self, key: &str, callback: F) -> SubscriptionId
    where
        F: FnMut(&Value, &mut StatePatch) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers
            .entry(key.to_string())
            .or_default()
            .push(Subscriber {
                id,
                callback: Box::new(callback),
            });
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        for subs in self.subscribers.values_mut() {
            let before = subs.len();
            subs.retain(|s| s.id != id);
            removed |= subs.len() != before;
        }
        self.subscribers.retain(|_, subs| !subs.is_empty());
        removed
    }

    /// Back to defaults through `set_state`, so every subscriber sees the
    /// reset, then drop the persisted snapshot.
    pub fn reset(&mut self) {
        let mut patch = StatePatch::new();
        for (key, value) in default_state() {
            patch.insert(&key, value);
        }
        self.set_state(patch);
        if let Err(e) = self.storage.remove_item(&self.storage_cfg.state_key) {
            log::warn!("could not clear persisted state: {e}");
        }
    }

    // ── Storage ────────────────────────────────────────────────────

    pub fn storage(&self) -> &dyn LocalStorage {
        self.storage.as_ref()
    }

    pub fn storage_mut(&mut self) -> &mut dyn LocalStorage {
        self.storage.as_mut()
    }

    fn persist(&mut self) {
        let snapshot = PersistedState::capture(&self.state);
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                log::error!("state snapshot not serializable: {e}");
                return;
            }
        };
        let key = self.storage_cfg.state_key.clone();
        match self.storage.set_item(&key, &json) {
            Ok(()) => {}
            Err(StorageError::QuotaExceeded { needed, available, .. }) => {
                let evicted = self.evict_namespace();
                log::warn!(
                    "storage quota exceeded ({needed} > {available} bytes); evicted {evicted} key(s), retrying"
                );
                if let Err(e) = self.storage.set_item(&key, &json) {
                    log::warn!("state not persisted after eviction: {e}");
                }
            }
            Err(e) => log::warn!("state not persisted: {e}"),
        }
    }

    /// Remove every other key under this app's namespace.
    fn evict_namespace(&mut self) -> usize {
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(e) => {
                log::warn!("cannot list storage keys for eviction: {e}");
                return 0;
            }
        };
        let mut evicted = 0;
        for k in keys {
            if k.starts_with(&self.storage_cfg.namespace) && k != self.storage_cfg.state_key {
                match self.storage.remove_item(&k) {
                    Ok(()) => evicted += 1,
                    Err(e) => log::warn!("could not evict '{k}': {e}"),
                }
            }
        }
        evicted
    }
}

/// Fresh-session state.
pub fn default_state() -> BTreeMap<String, Value> {
    let filters = serde_json::to_value(ReferralFilters::default()).unwrap_or(Value::Null);
    BTreeMap::from([
        (keys::CURRENT_VIEW.to_string(), json!("login")),
        (keys::IS_AUTHENTICATED.to_string(), json!(false)),
        (keys::CURRENT_USER.to_string(), Value::Null),
        (keys::REFERRALS.to_string(), json!([])),
        (keys::REFERRAL_FILTERS.to_string(), filters),
        (keys::SELECTED_REFERRAL.to_string(), Value::Null),
        (keys::ACTIVE_MODAL.to_string(), Value::Null),
        (keys::CAMPAIGN_FILTER.to_string(), json!("all")),
        (keys::POINTS_TREND.to_string(), Value::Null),
        (keys::TOAST.to_string(), Value::Null),
        (keys::LOADING.to_string(), json!(false)),
    ])
}
