//! Browser `localStorage` key/value store.

use async_trait::async_trait;

use super::KeyValueStore;
use crate::error::{Error, Result};

/// Key/value store backed by `window.localStorage`.
///
/// The storage handle is looked up on every call rather than held, which
/// keeps this type `Send + Sync` even though browser handles are not.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

fn storage() -> Result<web_sys::Storage> {
    let window = web_sys::window().ok_or_else(|| Error::KeyValue("no window".to_string()))?;
    match window.local_storage() {
        Ok(Some(storage)) => Ok(storage),
        Ok(None) => Err(Error::KeyValue("localStorage unavailable".to_string())),
        Err(e) => Err(Error::KeyValue(format!("localStorage access denied: {e:?}"))),
    }
}

fn js_error(op: &str, err: wasm_bindgen::JsValue) -> Error {
    Error::KeyValue(format!("localStorage {op} failed: {err:?}"))
}

#[async_trait]
impl KeyValueStore for LocalStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        storage()?.get_item(key).map_err(|e| js_error("get", e))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        // Quota errors surface here
        storage()?
            .set_item(key, value)
            .map_err(|e| js_error("set", e))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        storage()?.remove_item(key).map_err(|e| js_error("remove", e))
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let storage = storage()?;
        let len = storage.length().map_err(|e| js_error("length", e))?;
        let mut keys = Vec::with_capacity(len as usize);
        for index in 0..len {
            if let Some(key) = storage.key(index).map_err(|e| js_error("key", e))? {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}
