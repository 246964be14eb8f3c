//! User preferences kept in the key/value namespace.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use ecoair_types::{Coordinates, NotificationSettings, validate_city_name};

use crate::error::Result;
use crate::kv::{KeyValueStore, read_json, write_json};

/// Small typed settings stored as individual JSON values.
///
/// Preferences live in the key/value store on every platform, alongside the
/// key/value backend's collections when that backend is active. They survive
/// [`StorageFacade::reset_all`](crate::StorageFacade::reset_all).
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}:{name}", self.namespace)
    }

    fn prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    /// Last city looked up.
    pub async fn last_city(&self) -> Result<Option<String>> {
        read_json(self.store.as_ref(), &self.key("last_city")).await
    }

    pub async fn set_last_city(&self, city: &str) -> Result<()> {
        let city = validate_city_name(city)?;
        write_json(self.store.as_ref(), &self.key("last_city"), city).await
    }

    /// Whether the onboarding flow has been completed. Defaults to false.
    pub async fn onboarding_done(&self) -> Result<bool> {
        Ok(read_json(self.store.as_ref(), &self.key("onboarding"))
            .await?
            .unwrap_or(false))
    }

    pub async fn set_onboarding_done(&self, done: bool) -> Result<()> {
        write_json(self.store.as_ref(), &self.key("onboarding"), &done).await
    }

    /// Notification settings, or the defaults when none were saved.
    pub async fn notifications(&self) -> Result<NotificationSettings> {
        Ok(read_json(self.store.as_ref(), &self.key("notifications"))
            .await?
            .unwrap_or_default())
    }

    pub async fn set_notifications(&self, settings: &NotificationSettings) -> Result<()> {
        write_json(self.store.as_ref(), &self.key("notifications"), settings).await
    }

    /// Last known position of the user.
    pub async fn user_location(&self) -> Result<Option<Coordinates>> {
        read_json(self.store.as_ref(), &self.key("user_location")).await
    }

    pub async fn set_user_location(&self, location: &Coordinates) -> Result<()> {
        write_json(self.store.as_ref(), &self.key("user_location"), location).await
    }

    /// Every value in the namespace, decoded as JSON.
    ///
    /// Values that are not valid JSON are skipped with a warning.
    pub async fn export_all(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        let prefix = self.prefix();
        let keys: Vec<String> = self
            .store
            .list_keys()
            .await?
            .into_iter()
            .filter(|k| k.starts_with(&prefix))
            .collect();

        let mut exported = BTreeMap::new();
        for (key, raw) in self.store.get_many(&keys).await? {
            let Some(raw) = raw else { continue };
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    exported.insert(key, value);
                }
                Err(e) => warn!(key = %key, error = %e, "Skipping non-JSON value in export"),
            }
        }
        Ok(exported)
    }

    /// Write back values produced by [`export_all`](Self::export_all).
    ///
    /// Existing keys are overwritten; keys absent from `data` are left alone.
    pub async fn import(&self, data: &BTreeMap<String, serde_json::Value>) -> Result<usize> {
        let mut entries = BTreeMap::new();
        for (key, value) in data {
            entries.insert(key.clone(), serde_json::to_string(value)?);
        }
        self.store.set_many(&entries).await?;
        Ok(entries.len())
    }
}
