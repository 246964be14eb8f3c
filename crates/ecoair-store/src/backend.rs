//! Trait implemented by both storage backends.

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::config::BackendKind;
use crate::error::Result;
use crate::models::{
    CacheEntry, CachedAirQuality, FavoriteCity, FavoriteUpdate, MeasurementSample, NewFavorite,
    NewMeasurement, StorageStats,
};
use crate::queries::MeasurementQuery;

/// Persistence operations shared by the relational and key/value backends.
///
/// Callers go through [`StorageFacade`](crate::StorageFacade), which applies
/// configured defaults and logs failures. Implementations never panic on
/// storage failures; every error is returned.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    // --- Lifecycle ---

    /// Prepare storage. Safe to call more than once.
    async fn init(&self) -> Result<()>;

    /// Release underlying resources. Later operations fail with
    /// [`Error::Closed`](crate::Error::Closed) where a connection is involved.
    async fn close(&self) -> Result<()>;

    /// Remove every favorite, search, cached response and measurement.
    async fn reset_all(&self) -> Result<()>;

    /// Row counts per collection.
    async fn stats(&self) -> Result<StorageStats>;

    // --- Favorites ---

    /// Add a favorite and return its id.
    async fn add_favorite(&self, favorite: &NewFavorite) -> Result<i64>;

    /// Favorites, most recently added first.
    async fn list_favorites(&self) -> Result<Vec<FavoriteCity>>;

    /// Remove a favorite. Unknown ids are ignored.
    async fn remove_favorite(&self, id: i64) -> Result<()>;

    /// Whether a city is bookmarked, ignoring case.
    async fn is_favorite(&self, name: &str) -> Result<bool>;

    /// Apply the supplied fields. Unknown ids are ignored.
    async fn update_favorite(&self, id: i64, update: &FavoriteUpdate) -> Result<()>;

    // --- Search history ---

    /// Move `city` to the front of the log.
    async fn record_search(&self, city: &str) -> Result<()>;

    /// Up to `limit` distinct cities, most recent first.
    async fn recent_searches(&self, limit: usize) -> Result<Vec<String>>;

    async fn clear_search_history(&self) -> Result<()>;

    // --- AQI cache ---

    /// Store a response for `ttl_minutes`, replacing any entry for the city.
    async fn cache_air_quality(&self, entry: &CacheEntry, ttl_minutes: i64) -> Result<()>;

    /// Fresh cache entry for a city. Expired entries are deleted and reported absent.
    async fn cached_air_quality(&self, city: &str) -> Result<Option<CachedAirQuality>>;

    /// Delete every expired entry and return how many were removed.
    async fn purge_expired(&self) -> Result<usize>;

    // --- Measurement history ---

    /// Append a sample, then trim the city's series.
    async fn record_measurement(&self, measurement: &NewMeasurement) -> Result<()>;

    async fn query_measurements(&self, query: &MeasurementQuery) -> Result<Vec<MeasurementSample>>;

    /// Samples of `city` within the trailing `days`, oldest first.
    async fn measurement_range(&self, city: &str, days: i64) -> Result<Vec<MeasurementSample>> {
        let query = MeasurementQuery::trailing(city, days, OffsetDateTime::now_utc());
        self.query_measurements(&query).await
    }
}
