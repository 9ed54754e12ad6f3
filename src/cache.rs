use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::logging;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("key '{key}' was never set in this run")]
    KeyNotFound { key: String },
    #[error("serialize value of '{key}': {source}")]
    Serialization {
        key: String,
        source: serde_json::Error,
    },
    #[error("deserialize value of '{key}': {source}")]
    Deserialization {
        key: String,
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: serde_json::Value,
    pub registered_time: DateTime<Local>,
}

/// Key-value store shared by every test case of a run.
///
/// Readers share the lock, writers are serialized and the last write wins. Values are
/// serialized before the lock is taken, so an entry is either stored whole or not at all.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl CacheStore {
    pub fn new() -> Self {
        CacheStore::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(CacheStore::new())
    }
}

impl CacheStore {
    pub async fn set<T: Serialize>(&self, key: &str, value: T) -> Result<(), CacheError> {
        let value = serde_json::to_value(value).map_err(|source| CacheError::Serialization {
            key: key.to_string(),
            source,
        })?;
        let entry = CacheEntry {
            key: key.to_string(),
            value,
            registered_time: Local::now(),
        };
        let previous = self.entries.write().await.insert(key.to_string(), entry);
        match previous {
            Some(_) => logging::trace!("Cache entry overwritten: '{}'", key),
            None => logging::debug!("Cache entry set: '{}'", key),
        }
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        let value = self
            .entries
            .read()
            .await
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| CacheError::KeyNotFound {
                key: key.to_string(),
            })?;
        serde_json::from_value(value).map_err(|source| CacheError::Deserialization {
            key: key.to_string(),
            source,
        })
    }

    pub async fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn remove(&self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.write().await.remove(key);
        if removed.is_some() {
            logging::trace!("Cache entry removed: '{}'", key);
        }
        removed
    }

    /// Sorted by key.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Sorted by key.
    pub async fn entries(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<CacheEntry> = self.entries.read().await.values().cloned().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        logging::debug!("Cache cleared ({} entries)", entries.len());
        entries.clear();
    }

    /// Replaces the whole content with previously exported entries. Runs never call it; it
    /// serves `FSSnapshot::inspect_into` to look at what a finished run left behind.
    pub async fn restore(&self, restored: Vec<CacheEntry>) {
        let mut entries = self.entries.write().await;
        entries.clear();
        for entry in restored {
            entries.insert(entry.key.clone(), entry);
        }
        logging::debug!("Cache restored ({} entries)", entries.len());
    }
}
