//! Single entry point to local persistence.
//!
//! [`StorageFacade`] picks a backend once, applies configured defaults and
//! logs every failure before handing it back. Most callers use the
//! process-wide instance managed by [`init`], [`global`] and [`close`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info};

use ecoair_types::{Coordinates, NotificationSettings};

use crate::backend::StorageBackend;
use crate::config::{BackendKind, Limits, StoreConfig};
use crate::error::{Error, Result};
use crate::kv::{KeyValueStore, MemoryStore};
use crate::kv_backend::KeyValueBackend;
use crate::models::{
    CacheEntry, CachedAirQuality, FavoriteCity, FavoriteUpdate, MeasurementSample, NewFavorite,
    NewMeasurement, StorageStats,
};
use crate::preferences::Preferences;
use crate::queries::MeasurementQuery;

/// Log a failed operation and pass the result through.
fn logged<T>(op: &'static str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if e.is_storage() {
            error!(op, error = %e, "Storage operation failed");
        } else {
            info!(op, reason = %e, "Storage operation declined");
        }
    }
    result
}

/// Key/value store used for preferences and the key/value backend.
fn open_kv_store(config: &StoreConfig) -> Result<Arc<dyn KeyValueStore>> {
    if config.in_memory {
        return Ok(Arc::new(MemoryStore::new()));
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Ok(Arc::new(crate::kv::FileStore::new(config.kv_dir())))
    }

    #[cfg(target_arch = "wasm32")]
    {
        Ok(Arc::new(crate::kv::LocalStorage::new()))
    }
}

/// Build the backend selected by `config`.
///
/// This is the only place that looks at the backend kind; everything else
/// talks to [`StorageBackend`].
pub fn open_backend(
    config: &StoreConfig,
    kv: Arc<dyn KeyValueStore>,
) -> Result<Box<dyn StorageBackend>> {
    let limits = config.limits.clone();
    match config.backend_kind() {
        BackendKind::KeyValue => Ok(Box::new(KeyValueBackend::new(kv, &config.namespace, limits))),
        BackendKind::Relational => open_relational(config, limits),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn open_relational(config: &StoreConfig, limits: Limits) -> Result<Box<dyn StorageBackend>> {
    use crate::sqlite::SqliteBackend;

    let backend = if config.in_memory {
        SqliteBackend::open_in_memory(limits)?
    } else {
        SqliteBackend::open(config.database_path(), limits)?
    };
    Ok(Box::new(backend))
}

#[cfg(target_arch = "wasm32")]
fn open_relational(_config: &StoreConfig, _limits: Limits) -> Result<Box<dyn StorageBackend>> {
    Err(Error::Unsupported("SQLite is not available in the browser"))
}

/// Facade over the selected backend and the preferences store.
pub struct StorageFacade {
    backend: Box<dyn StorageBackend>,
    preferences: Preferences,
    limits: Limits,
}

impl StorageFacade {
    /// Open storage as described by `config` and initialize it.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        let kv = logged("open", open_kv_store(config))?;
        let backend = logged("open", open_backend(config, kv.clone()))?;
        logged("init", backend.init().await)?;

        info!(backend = %backend.kind(), in_memory = config.in_memory, "Storage ready");
        Ok(Self {
            backend,
            preferences: Preferences::new(kv, config.namespace.clone()),
            limits: config.limits.clone(),
        })
    }

    /// Assemble a facade from parts. No initialization is performed.
    pub fn from_parts(
        backend: Box<dyn StorageBackend>,
        preferences: Preferences,
        limits: Limits,
    ) -> Self {
        Self {
            backend,
            preferences,
            limits,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Release the backend's resources.
    pub async fn close(&self) -> Result<()> {
        logged("close", self.backend.close().await)
    }

    // === Favorites ===

    pub async fn add_favorite(&self, favorite: &NewFavorite) -> Result<i64> {
        logged("add_favorite", self.backend.add_favorite(favorite).await)
    }

    pub async fn list_favorites(&self) -> Result<Vec<FavoriteCity>> {
        logged("list_favorites", self.backend.list_favorites().await)
    }

    pub async fn remove_favorite(&self, id: i64) -> Result<()> {
        logged("remove_favorite", self.backend.remove_favorite(id).await)
    }

    pub async fn is_favorite(&self, name: &str) -> Result<bool> {
        logged("is_favorite", self.backend.is_favorite(name).await)
    }

    pub async fn update_favorite(&self, id: i64, update: &FavoriteUpdate) -> Result<()> {
        logged("update_favorite", self.backend.update_favorite(id, update).await)
    }

    // === Search history ===

    pub async fn record_search(&self, city: &str) -> Result<()> {
        logged("record_search", self.backend.record_search(city).await)
    }

    /// Most recent distinct searches, up to the configured default.
    pub async fn recent_searches(&self) -> Result<Vec<String>> {
        self.recent_searches_limited(self.limits.recent_searches)
            .await
    }

    pub async fn recent_searches_limited(&self, limit: usize) -> Result<Vec<String>> {
        logged("recent_searches", self.backend.recent_searches(limit).await)
    }

    pub async fn clear_search_history(&self) -> Result<()> {
        logged(
            "clear_search_history",
            self.backend.clear_search_history().await,
        )
    }

    // === AQI cache ===

    /// Cache a response for the configured lifetime.
    pub async fn cache_air_quality(&self, entry: &CacheEntry) -> Result<()> {
        self.cache_air_quality_for(entry, self.limits.cache_ttl_minutes)
            .await
    }

    pub async fn cache_air_quality_for(&self, entry: &CacheEntry, ttl_minutes: i64) -> Result<()> {
        logged(
            "cache_air_quality",
            self.backend.cache_air_quality(entry, ttl_minutes).await,
        )
    }

    pub async fn cached_air_quality(&self, city: &str) -> Result<Option<CachedAirQuality>> {
        logged("cached_air_quality", self.backend.cached_air_quality(city).await)
    }

    pub async fn purge_expired(&self) -> Result<usize> {
        logged("purge_expired", self.backend.purge_expired().await)
    }

    // === Measurement history ===

    pub async fn record_measurement(&self, measurement: &NewMeasurement) -> Result<()> {
        logged(
            "record_measurement",
            self.backend.record_measurement(measurement).await,
        )
    }

    /// Samples of `city` over the configured trailing window, oldest first.
    pub async fn measurement_range(&self, city: &str) -> Result<Vec<MeasurementSample>> {
        self.measurement_range_days(city, self.limits.range_days)
            .await
    }

    pub async fn measurement_range_days(
        &self,
        city: &str,
        days: i64,
    ) -> Result<Vec<MeasurementSample>> {
        logged(
            "measurement_range",
            self.backend.measurement_range(city, days).await,
        )
    }

    pub async fn query_measurements(
        &self,
        query: &MeasurementQuery,
    ) -> Result<Vec<MeasurementSample>> {
        logged(
            "query_measurements",
            self.backend.query_measurements(query).await,
        )
    }

    // === Maintenance ===

    pub async fn stats(&self) -> Result<StorageStats> {
        logged("stats", self.backend.stats().await)
    }

    /// Empty every collection. Preferences are kept.
    pub async fn reset_all(&self) -> Result<()> {
        logged("reset_all", self.backend.reset_all().await)
    }

    // === Preferences ===

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub async fn last_city(&self) -> Result<Option<String>> {
        logged("last_city", self.preferences.last_city().await)
    }

    pub async fn set_last_city(&self, city: &str) -> Result<()> {
        logged("set_last_city", self.preferences.set_last_city(city).await)
    }

    pub async fn onboarding_done(&self) -> Result<bool> {
        logged("onboarding_done", self.preferences.onboarding_done().await)
    }

    pub async fn set_onboarding_done(&self, done: bool) -> Result<()> {
        logged(
            "set_onboarding_done",
            self.preferences.set_onboarding_done(done).await,
        )
    }

    pub async fn notifications(&self) -> Result<NotificationSettings> {
        logged("notifications", self.preferences.notifications().await)
    }

    pub async fn set_notifications(&self, settings: &NotificationSettings) -> Result<()> {
        logged(
            "set_notifications",
            self.preferences.set_notifications(settings).await,
        )
    }

    pub async fn user_location(&self) -> Result<Option<Coordinates>> {
        logged("user_location", self.preferences.user_location().await)
    }

    pub async fn set_user_location(&self, location: &Coordinates) -> Result<()> {
        logged(
            "set_user_location",
            self.preferences.set_user_location(location).await,
        )
    }

    // === Export / import ===

    pub async fn export_all(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        logged("export_all", self.preferences.export_all().await)
    }

    pub async fn import(&self, data: &BTreeMap<String, serde_json::Value>) -> Result<usize> {
        logged("import", self.preferences.import(data).await)
    }
}

// === Process-wide instance ===

static GLOBAL: Mutex<Option<Arc<StorageFacade>>> = Mutex::new(None);

fn global_slot() -> std::sync::MutexGuard<'static, Option<Arc<StorageFacade>>> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Open the process-wide storage.
///
/// Calling this again while storage is open returns the existing instance and
/// ignores `config`.
pub async fn init(config: &StoreConfig) -> Result<Arc<StorageFacade>> {
    if let Some(existing) = global_slot().as_ref() {
        return Ok(existing.clone());
    }

    let facade = Arc::new(StorageFacade::open(config).await?);

    let winner = {
        let mut slot = global_slot();
        match slot.clone() {
            Some(existing) => Some(existing),
            None => {
                *slot = Some(facade.clone());
                None
            }
        }
    };

    match winner {
        // Another task finished opening first
        Some(existing) => {
            facade.close().await?;
            Ok(existing)
        }
        None => Ok(facade),
    }
}

/// The process-wide storage, if [`init`] has run.
pub fn global() -> Result<Arc<StorageFacade>> {
    global_slot().clone().ok_or(Error::NotInitialized)
}

/// Close the process-wide storage. Does nothing when it is not open.
pub async fn close() -> Result<()> {
    let facade = global_slot().take();
    match facade {
        Some(facade) => {
            facade.close().await?;
            info!("Storage closed");
            Ok(())
        }
        None => Ok(()),
    }
}
