//! In-memory key/value store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::KeyValueStore;
use crate::error::{Error, Result};

/// Key/value store held in process memory.
///
/// Writes can be made to fail with [`MemoryStore::set_fail_writes`], which
/// lets tests exercise storage failure paths without a broken disk.
///
/// ```
/// use ecoair_store::kv::{KeyValueStore, MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ecoair_store::Result<()> {
/// let store = MemoryStore::new();
/// store.set("greeting", "bonjour").await?;
/// assert_eq!(store.get("greeting").await?.as_deref(), Some("bonjour"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write (set or remove) fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(Error::KeyValue("simulated write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check_writable()?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.get("k").await.unwrap().is_none());

        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_list_keys_sorted() {
        let store = MemoryStore::new();
        store.set("b", "2").await.unwrap();
        store.set("a", "1").await.unwrap();
        assert_eq!(store.list_keys().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_write_failure_injection() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();
        store.set_fail_writes(true);

        assert!(matches!(store.set("k", "x").await, Err(Error::KeyValue(_))));
        assert!(store.remove("k").await.is_err());
        // Reads still work and the old value is intact
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        store.set_fail_writes(false);
        store.set("k", "x").await.unwrap();
    }
}
