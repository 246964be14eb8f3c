//! Backend storing collections as JSON blobs in a key/value store.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use ecoair_types::{city_key, validate_city_name};

use crate::backend::StorageBackend;
use crate::config::{BackendKind, Limits};
use crate::error::{Error, Result};
use crate::kv::{KeyValueStore, read_json, write_json};
use crate::models::{
    CacheEntry, CachedAirQuality, FavoriteCity, FavoriteUpdate, MeasurementSample, NewFavorite,
    NewMeasurement, StorageStats,
};
use crate::queries::MeasurementQuery;
use crate::retention::{self, now_utc, same_city};

/// Key/value backend used where SQLite is unavailable.
///
/// Favorites and search history are each kept as one JSON array under
/// `<namespace>:favorites` and `<namespace>:history`. Every write reads the
/// whole collection, changes it and writes it back; there is a single
/// foreground writer per process, so no lock is taken across the round trip.
///
/// The AQI cache and the measurement history are not persisted here: writes
/// succeed without storing anything and reads come back empty.
pub struct KeyValueBackend {
    store: Arc<dyn KeyValueStore>,
    favorites_key: String,
    history_key: String,
    limits: Limits,
}

impl KeyValueBackend {
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: &str, limits: Limits) -> Self {
        Self {
            store,
            favorites_key: format!("{namespace}:favorites"),
            history_key: format!("{namespace}:history"),
            limits,
        }
    }

    async fn load_favorites(&self) -> Result<Vec<FavoriteCity>> {
        Ok(read_json(self.store.as_ref(), &self.favorites_key)
            .await?
            .unwrap_or_default())
    }

    async fn save_favorites(&self, favorites: &[FavoriteCity]) -> Result<()> {
        write_json(self.store.as_ref(), &self.favorites_key, favorites).await
    }

    async fn load_history(&self) -> Result<Vec<String>> {
        Ok(read_json(self.store.as_ref(), &self.history_key)
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl StorageBackend for KeyValueBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn reset_all(&self) -> Result<()> {
        self.store
            .remove_many(&[self.favorites_key.clone(), self.history_key.clone()])
            .await?;
        info!("Key/value storage reset");
        Ok(())
    }

    async fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            favorites: self.load_favorites().await?.len() as u64,
            search_history: self.load_history().await?.len() as u64,
            cached: 0,
            measurements: 0,
        })
    }

    // === Favorites ===

    async fn add_favorite(&self, favorite: &NewFavorite) -> Result<i64> {
        let favorite = favorite.validated()?;
        let mut favorites = self.load_favorites().await?;

        if favorites.iter().any(|f| same_city(&f.name, &favorite.name)) {
            return Err(Error::DuplicateFavorite(favorite.name));
        }
        if favorites.len() >= self.limits.max_favorites {
            return Err(Error::FavoritesLimitReached(self.limits.max_favorites));
        }

        let now = now_utc();
        let id = retention::next_id(favorites.iter().map(|f| f.id), now);
        favorites.insert(
            0,
            FavoriteCity {
                id,
                name: favorite.name,
                country: favorite.country,
                latitude: favorite.latitude,
                longitude: favorite.longitude,
                added_at: now,
                updated_at: now,
            },
        );
        self.save_favorites(&favorites).await?;
        debug!(id, "Added favorite");
        Ok(id)
    }

    async fn list_favorites(&self) -> Result<Vec<FavoriteCity>> {
        let mut favorites = self.load_favorites().await?;
        favorites.sort_by(|a, b| b.added_at.cmp(&a.added_at).then(b.id.cmp(&a.id)));
        Ok(favorites)
    }

    async fn remove_favorite(&self, id: i64) -> Result<()> {
        let mut favorites = self.load_favorites().await?;
        let before = favorites.len();
        favorites.retain(|f| f.id != id);
        if favorites.len() != before {
            self.save_favorites(&favorites).await?;
        }
        Ok(())
    }

    async fn is_favorite(&self, name: &str) -> Result<bool> {
        let key = city_key(name);
        Ok(self
            .load_favorites()
            .await?
            .iter()
            .any(|f| city_key(&f.name) == key))
    }

    async fn update_favorite(&self, id: i64, update: &FavoriteUpdate) -> Result<()> {
        let update = update.validated()?;
        let mut favorites = self.load_favorites().await?;

        if let Some(name) = &update.name
            && favorites
                .iter()
                .any(|f| f.id != id && same_city(&f.name, name))
        {
            return Err(Error::DuplicateFavorite(name.clone()));
        }

        let Some(favorite) = favorites.iter_mut().find(|f| f.id == id) else {
            return Ok(());
        };
        update.apply_to(favorite, now_utc());
        self.save_favorites(&favorites).await
    }

    // === Search history ===

    async fn record_search(&self, city: &str) -> Result<()> {
        let name = validate_city_name(city)?.to_string();
        let mut history = self.load_history().await?;
        retention::push_front_dedup(&mut history, name, self.limits.search_history_cap, |a, b| {
            same_city(a, b)
        });
        write_json(self.store.as_ref(), &self.history_key, &history).await
    }

    async fn recent_searches(&self, limit: usize) -> Result<Vec<String>> {
        let history = self.load_history().await?;
        Ok(retention::dedup_case_insensitive(history, limit))
    }

    async fn clear_search_history(&self) -> Result<()> {
        self.store.remove(&self.history_key).await
    }

    // === AQI cache (not persisted) ===

    async fn cache_air_quality(&self, entry: &CacheEntry, _ttl_minutes: i64) -> Result<()> {
        validate_city_name(&entry.city_name)?;
        debug!(city = %entry.city_name, "Cache is not persisted on this backend");
        Ok(())
    }

    async fn cached_air_quality(&self, _city: &str) -> Result<Option<CachedAirQuality>> {
        Ok(None)
    }

    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }

    // === Measurement history (not persisted) ===

    async fn record_measurement(&self, measurement: &NewMeasurement) -> Result<()> {
        validate_city_name(&measurement.city_name)?;
        debug!(city = %measurement.city_name, "Measurements are not persisted on this backend");
        Ok(())
    }

    async fn query_measurements(&self, _query: &MeasurementQuery) -> Result<Vec<MeasurementSample>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;

    fn backend_with(store: Arc<MemoryStore>) -> KeyValueBackend {
        KeyValueBackend::new(store, "test", Limits::default())
    }

    #[tokio::test]
    async fn test_blob_keys_use_namespace() {
        let store = Arc::new(MemoryStore::new());
        let backend = backend_with(store.clone());
        backend.add_favorite(&NewFavorite::new("Tokyo")).await.unwrap();
        backend.record_search("Tokyo").await.unwrap();

        assert_eq!(
            store.list_keys().await.unwrap(),
            vec!["test:favorites", "test:history"]
        );
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_increasing() {
        let backend = backend_with(Arc::new(MemoryStore::new()));
        let a = backend.add_favorite(&NewFavorite::new("A")).await.unwrap();
        let b = backend.add_favorite(&NewFavorite::new("B")).await.unwrap();
        let c = backend.add_favorite(&NewFavorite::new("C")).await.unwrap();
        assert!(a < b && b < c);

        let names: Vec<String> = backend
            .list_favorites()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn test_write_failure_is_returned() {
        let store = Arc::new(MemoryStore::new());
        let backend = backend_with(store.clone());
        store.set_fail_writes(true);

        let err = backend
            .add_favorite(&NewFavorite::new("Paris"))
            .await
            .unwrap_err();
        assert!(err.is_storage());

        store.set_fail_writes(false);
        assert!(backend.list_favorites().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_blob_surfaces_error() {
        let store = Arc::new(MemoryStore::new());
        store.set("test:favorites", "not json").await.unwrap();
        let backend = backend_with(store);

        assert!(matches!(
            backend.list_favorites().await,
            Err(Error::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_and_measurements_are_no_ops() {
        let backend = backend_with(Arc::new(MemoryStore::new()));
        backend
            .cache_air_quality(&CacheEntry::new("Paris", 50, serde_json::json!({})), 30)
            .await
            .unwrap();
        assert!(backend.cached_air_quality("Paris").await.unwrap().is_none());
        assert_eq!(backend.purge_expired().await.unwrap(), 0);

        backend
            .record_measurement(&NewMeasurement::new("Paris", 50))
            .await
            .unwrap();
        assert!(backend.measurement_range("Paris", 7).await.unwrap().is_empty());

        let stats = backend.stats().await.unwrap();
        assert_eq!(stats.cached, 0);
        assert_eq!(stats.measurements, 0);
    }

    #[tokio::test]
    async fn test_blank_city_rejected_even_when_not_persisted() {
        let backend = backend_with(Arc::new(MemoryStore::new()));

        let err = backend
            .cache_air_quality(&CacheEntry::new("   ", 50, serde_json::Value::Null), 30)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = backend
            .record_measurement(&NewMeasurement::new("", 50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
