//! Storage backends
//!
//! Two tiers:
//! - `KeyValueStore`: device-scoped string storage (LocalStorage on web,
//!   `MemoryStore` natively and in tests)
//! - `RemoteStore`: the shared leaderboard copy, consulted opportunistically

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::highscores::ScoreEntry;

/// Storage failures. Always absorbed by the score store; never shown to players.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No backing store exists (e.g. the remote tier was never configured)
    #[error("store not configured")]
    NotConfigured,

    /// The store exists but could not be reached or refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// String key/value storage scoped to one device.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Read and decode a JSON value. Missing keys yield `Ok(None)`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        Self: Sized,
    {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode a value as JSON and store it.
    fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

/// In-process store, used natively and as the test double for LocalStorage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// The shared leaderboard copy. No locking: last write wins.
pub trait RemoteStore {
    /// Read the full stored entry set (unsorted as far as callers know)
    fn load(&mut self) -> Result<Vec<ScoreEntry>, StoreError>;
    /// Replace the stored entry set
    fn save(&mut self, entries: &[ScoreEntry]) -> Result<(), StoreError>;
}

/// Remote tier that was never configured. Every call fails with `NotConfigured`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl RemoteStore for NoRemote {
    fn load(&mut self) -> Result<Vec<ScoreEntry>, StoreError> {
        Err(StoreError::NotConfigured)
    }

    fn save(&mut self, _entries: &[ScoreEntry]) -> Result<(), StoreError> {
        Err(StoreError::NotConfigured)
    }
}

/// Remote tier backed by any key/value store, holding the list as one JSON value.
#[derive(Debug, Clone)]
pub struct KvRemote<K> {
    kv: K,
    key: String,
}

impl<K: KeyValueStore> KvRemote<K> {
    /// Key the shared leaderboard lives under
    pub const DEFAULT_KEY: &'static str = "debug_or_die_leaderboard";

    pub fn new(kv: K) -> Self {
        Self {
            kv,
            key: Self::DEFAULT_KEY.to_string(),
        }
    }

    pub fn inner(&self) -> &K {
        &self.kv
    }
}

impl<K: KeyValueStore> RemoteStore for KvRemote<K> {
    fn load(&mut self) -> Result<Vec<ScoreEntry>, StoreError> {
        Ok(self.kv.get_json(&self.key)?.unwrap_or_default())
    }

    fn save(&mut self, entries: &[ScoreEntry]) -> Result<(), StoreError> {
        self.kv.set_json(&self.key, &entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("hi_score").unwrap(), None);

        store.set("hi_score", "42").unwrap();
        assert_eq!(store.get("hi_score").unwrap().as_deref(), Some("42"));

        store.remove("hi_score").unwrap();
        assert_eq!(store.get("hi_score").unwrap(), None);
    }

    #[test]
    fn test_get_json_rejects_corrupt_data() {
        let mut store = MemoryStore::new();
        store.set("leaderboard", "{not json").unwrap();
        let result: Result<Option<Vec<ScoreEntry>>, _> = store.get_json("leaderboard");
        assert!(matches!(result, Err(StoreError::Serde(_))));
    }

    #[test]
    fn test_no_remote_is_not_configured() {
        let mut remote = NoRemote;
        assert!(matches!(remote.load(), Err(StoreError::NotConfigured)));
        assert!(matches!(remote.save(&[]), Err(StoreError::NotConfigured)));
    }

    #[test]
    fn test_kv_remote_empty_then_saved() {
        let mut remote = KvRemote::new(MemoryStore::new());
        assert!(remote.load().unwrap().is_empty());

        let entry = ScoreEntry {
            name: "AAA".to_string(),
            score: 100,
            date: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        };
        remote.save(std::slice::from_ref(&entry)).unwrap();

        let loaded = remote.load().unwrap();
        assert_eq!(loaded, vec![entry]);
        assert!(remote.inner().get(KvRemote::<MemoryStore>::DEFAULT_KEY).unwrap().is_some());
    }
}
