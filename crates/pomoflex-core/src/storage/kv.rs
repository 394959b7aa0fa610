//! Key-value store abstraction for snapshot persistence.

use std::collections::HashMap;

use crate::error::StorageError;

/// A string-to-string store. Writes to different keys are independent;
/// nothing is atomic across keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// In-memory store with an optional size quota.
///
/// The quota counts the bytes of all keys and values, like browser storage
/// does, and rejects writes that would exceed it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            let replaced = self.entries.get(key).map_or(0, |v| key.len() + v.len());
            let available = quota.saturating_sub(self.used_bytes() - replaced);
            let needed = key.len() + value.len();
            if needed > available {
                return Err(StorageError::QuotaExceeded { needed, available });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
