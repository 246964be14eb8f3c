//! Key/value storage abstraction.
//!
//! Values are opaque strings; callers that store structured data go through
//! [`read_json`] and [`write_json`]. Implementations:
//!
//! - [`MemoryStore`]: process-local map, for tests and ephemeral sessions
//! - [`FileStore`]: one file per key in a directory (native only)
//! - [`LocalStorage`]: the browser's `window.localStorage` (wasm32 only)

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

mod memory;
pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(target_arch = "wasm32")]
mod local_storage;
#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorage;

/// Asynchronous string key/value store.
///
/// Missing keys read as `None` and removing a missing key succeeds.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, overwriting any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Every key currently stored, in ascending order.
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Read several keys at once. Absent keys map to `None`.
    async fn get_many(&self, keys: &[String]) -> Result<BTreeMap<String, Option<String>>> {
        let mut values = BTreeMap::new();
        for key in keys {
            values.insert(key.clone(), self.get(key).await?);
        }
        Ok(values)
    }

    /// Write several keys. Stops at the first failure.
    async fn set_many(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// Read and decode a JSON value.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode a value as JSON and store it.
pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}
