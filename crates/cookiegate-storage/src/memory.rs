//! In-memory key-value store

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StorageError;
use crate::kv::PersistentKv;
use crate::Result;

/// Process-local store. With a quota, a write that would push the total
/// size of keys and values past it fails and leaves the store unchanged.
pub struct MemoryKv {
    entries: Arc<RwLock<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            quota: None,
        }
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            quota: Some(quota),
        }
    }

    /// Total bytes held by keys and values
    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryKv {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            quota: self.quota,
        }
    }
}

impl PersistentKv for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write();

        if let Some(quota) = self.quota {
            let replaced = entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let used: usize = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
            let needed = used - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}
