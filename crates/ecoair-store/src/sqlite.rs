//! Relational backend on top of SQLite.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rusqlite::{Row, params};
use tracing::{debug, info, warn};

use ecoair_types::{Pollutants, city_key, validate_city_name};

use crate::backend::StorageBackend;
use crate::config::{BackendKind, Limits};
use crate::database::{Database, column_time, map_unique_violation};
use crate::error::{Error, Result};
use crate::models::{
    CacheEntry, CachedAirQuality, FavoriteCity, FavoriteUpdate, MeasurementSample, NewFavorite,
    NewMeasurement, StorageStats,
};
use crate::queries::MeasurementQuery;
use crate::retention::{self, now_utc, truncate_to_seconds};

/// SQLite-backed storage.
///
/// The connection sits behind a mutex held for the whole of each operation,
/// so a cache read and the purge of the expired row it found are atomic with
/// respect to concurrent writers.
pub struct SqliteBackend {
    db: Mutex<Option<Database>>,
    limits: Limits,
}

impl SqliteBackend {
    /// Open or create the database file.
    pub fn open<P: AsRef<Path>>(path: P, limits: Limits) -> Result<Self> {
        Ok(Self::with_database(Database::open(path)?, limits))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(limits: Limits) -> Result<Self> {
        Ok(Self::with_database(Database::open_in_memory()?, limits))
    }

    pub fn with_database(db: Database, limits: Limits) -> Self {
        Self {
            db: Mutex::new(Some(db)),
            limits,
        }
    }

    fn with_db<T>(&self, f: impl FnOnce(&mut Database) -> Result<T>) -> Result<T> {
        let mut guard = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        let db = guard.as_mut().ok_or(Error::Closed)?;
        f(db)
    }
}

fn favorite_from_row(row: &Row<'_>) -> rusqlite::Result<FavoriteCity> {
    Ok(FavoriteCity {
        id: row.get(0)?,
        name: row.get(1)?,
        country: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        added_at: column_time(row, 5)?,
        updated_at: column_time(row, 6)?,
    })
}

fn sample_from_row(row: &Row<'_>) -> rusqlite::Result<MeasurementSample> {
    Ok(MeasurementSample {
        id: row.get(0)?,
        city_name: row.get(1)?,
        aqi: row.get(2)?,
        pollutants: Pollutants {
            pm25: row.get(3)?,
            pm10: row.get(4)?,
            o3: row.get(5)?,
            no2: row.get(6)?,
        },
        measured_at: column_time(row, 7)?,
    })
}

fn to_sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Keep the newest `cap` searches.
fn trim_search_history(db: &Database, cap: usize) -> Result<usize> {
    let result = db.run(
        "DELETE FROM search_history WHERE id NOT IN (
            SELECT id FROM search_history ORDER BY searched_at DESC, id DESC LIMIT ?1
         )",
        [to_sql_count(cap)],
    )?;
    Ok(result.changes)
}

/// Keep the newest `cap` samples of one city.
fn trim_measurements(db: &Database, key: &str, cap: usize) -> Result<usize> {
    let count: i64 = db
        .query_one(
            "SELECT COUNT(*) FROM air_quality_history WHERE city_key = ?1",
            [key],
            |row| row.get(0),
        )?
        .unwrap_or(0);

    let excess = retention::excess(usize::try_from(count).unwrap_or(0), cap);
    if excess == 0 {
        return Ok(0);
    }

    let result = db.run(
        "DELETE FROM air_quality_history WHERE id IN (
            SELECT id FROM air_quality_history WHERE city_key = ?1
            ORDER BY measured_at ASC, id ASC LIMIT ?2
         )",
        params![key, to_sql_count(excess)],
    )?;
    Ok(result.changes)
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    async fn init(&self) -> Result<()> {
        self.with_db(|db| db.ensure_schema())
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            info!("Closed database connection");
        }
        Ok(())
    }

    async fn reset_all(&self) -> Result<()> {
        self.with_db(|db| db.recreate_tables())?;
        info!("Database reset");
        Ok(())
    }

    async fn stats(&self) -> Result<StorageStats> {
        self.with_db(|db| {
            Ok(StorageStats {
                favorites: db.count("favorites")?,
                search_history: db.count("search_history")?,
                cached: db.count("air_quality_cache")?,
                measurements: db.count("air_quality_history")?,
            })
        })
    }

    // === Favorites ===

    async fn add_favorite(&self, favorite: &NewFavorite) -> Result<i64> {
        let favorite = favorite.validated()?;
        let key = city_key(&favorite.name);
        let max = self.limits.max_favorites;

        self.with_db(|db| {
            let existing: Option<i64> = db.query_one(
                "SELECT id FROM favorites WHERE name_key = ?1",
                [&key],
                |row| row.get(0),
            )?;
            if existing.is_some() {
                return Err(Error::DuplicateFavorite(favorite.name.clone()));
            }
            if db.count("favorites")? >= max as u64 {
                return Err(Error::FavoritesLimitReached(max));
            }

            let now = now_utc().unix_timestamp();
            let result = db
                .run(
                    "INSERT INTO favorites
                        (name, name_key, country, latitude, longitude, added_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![
                        favorite.name,
                        key,
                        favorite.country,
                        favorite.latitude,
                        favorite.longitude,
                        now
                    ],
                )
                .map_err(|e| {
                    map_unique_violation(e, || Error::DuplicateFavorite(favorite.name.clone()))
                })?;

            debug!(id = result.last_insert_id, name = %favorite.name, "Added favorite");
            Ok(result.last_insert_id)
        })
    }

    async fn list_favorites(&self) -> Result<Vec<FavoriteCity>> {
        self.with_db(|db| {
            db.query_all(
                "SELECT id, name, country, latitude, longitude, added_at, updated_at
                 FROM favorites ORDER BY added_at DESC, id DESC",
                [],
                favorite_from_row,
            )
        })
    }

    async fn remove_favorite(&self, id: i64) -> Result<()> {
        self.with_db(|db| {
            let result = db.run("DELETE FROM favorites WHERE id = ?1", [id])?;
            debug!(id, removed = result.changes, "Remove favorite");
            Ok(())
        })
    }

    async fn is_favorite(&self, name: &str) -> Result<bool> {
        let key = city_key(name);
        self.with_db(|db| {
            let found: Option<i64> =
                db.query_one("SELECT 1 FROM favorites WHERE name_key = ?1", [&key], |row| {
                    row.get(0)
                })?;
            Ok(found.is_some())
        })
    }

    async fn update_favorite(&self, id: i64, update: &FavoriteUpdate) -> Result<()> {
        let update = update.validated()?;
        let name_key = update.name.as_deref().map(city_key);

        self.with_db(|db| {
            if let (Some(name), Some(key)) = (&update.name, &name_key) {
                let clash: Option<i64> = db.query_one(
                    "SELECT id FROM favorites WHERE name_key = ?1 AND id != ?2",
                    params![key, id],
                    |row| row.get(0),
                )?;
                if clash.is_some() {
                    return Err(Error::DuplicateFavorite(name.clone()));
                }
            }

            let result = db
                .run(
                    "UPDATE favorites SET
                        name = COALESCE(?2, name),
                        name_key = COALESCE(?3, name_key),
                        country = COALESCE(?4, country),
                        latitude = COALESCE(?5, latitude),
                        longitude = COALESCE(?6, longitude),
                        updated_at = ?7
                     WHERE id = ?1",
                    params![
                        id,
                        update.name,
                        name_key,
                        update.country,
                        update.latitude,
                        update.longitude,
                        now_utc().unix_timestamp()
                    ],
                )
                .map_err(|e| {
                    map_unique_violation(e, || {
                        Error::DuplicateFavorite(update.name.clone().unwrap_or_default())
                    })
                })?;

            debug!(id, updated = result.changes, "Update favorite");
            Ok(())
        })
    }

    // === Search history ===

    async fn record_search(&self, city: &str) -> Result<()> {
        let name = validate_city_name(city)?.to_string();
        let key = city_key(&name);
        let cap = self.limits.search_history_cap;

        self.with_db(|db| {
            let now = now_utc().unix_timestamp();
            db.transaction(|tx| {
                tx.execute("DELETE FROM search_history WHERE city_key = ?1", [&key])?;
                tx.execute(
                    "INSERT INTO search_history (city_name, city_key, searched_at)
                     VALUES (?1, ?2, ?3)",
                    params![name, key, now],
                )?;
                Ok(())
            })?;

            // The search itself is committed; an oversized log is tolerated.
            if let Err(e) = trim_search_history(db, cap) {
                warn!(error = %e, "Failed to trim search history");
            }
            Ok(())
        })
    }

    async fn recent_searches(&self, limit: usize) -> Result<Vec<String>> {
        let names = self.with_db(|db| {
            db.query_all(
                "SELECT city_name FROM search_history ORDER BY searched_at DESC, id DESC",
                [],
                |row| row.get::<_, String>(0),
            )
        })?;
        Ok(retention::dedup_case_insensitive(names, limit))
    }

    async fn clear_search_history(&self) -> Result<()> {
        self.with_db(|db| db.run("DELETE FROM search_history", []).map(|_| ()))
    }

    // === AQI cache ===

    async fn cache_air_quality(&self, entry: &CacheEntry, ttl_minutes: i64) -> Result<()> {
        let name = validate_city_name(&entry.city_name)?;
        let key = city_key(name);
        let data = serde_json::to_string(&entry.data)?;
        let now = now_utc();
        let expires_at = retention::expires_at(now, ttl_minutes);

        self.with_db(|db| {
            db.run(
                "INSERT INTO air_quality_cache
                    (city_name, city_key, aqi, level, data, cached_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(city_key) DO UPDATE SET
                    city_name = excluded.city_name,
                    aqi = excluded.aqi,
                    level = excluded.level,
                    data = excluded.data,
                    cached_at = excluded.cached_at,
                    expires_at = excluded.expires_at",
                params![
                    name,
                    key,
                    entry.aqi,
                    entry.level,
                    data,
                    now.unix_timestamp(),
                    expires_at.unix_timestamp()
                ],
            )?;
            debug!(city = name, aqi = entry.aqi, ttl_minutes, "Cached air quality");
            Ok(())
        })
    }

    async fn cached_air_quality(&self, city: &str) -> Result<Option<CachedAirQuality>> {
        let key = city_key(city);

        self.with_db(|db| {
            let row = db.query_one(
                "SELECT city_name, aqi, level, data, cached_at, expires_at
                 FROM air_quality_cache WHERE city_key = ?1",
                [&key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i32>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        column_time(row, 4)?,
                        column_time(row, 5)?,
                    ))
                },
            )?;

            let Some((city_name, aqi, level, data, cached_at, expires_at)) = row else {
                debug!(city, "Cache miss");
                return Ok(None);
            };

            if retention::is_expired(now_utc(), expires_at) {
                db.run("DELETE FROM air_quality_cache WHERE city_key = ?1", [&key])?;
                debug!(city, "Cache entry expired");
                return Ok(None);
            }

            debug!(city, "Cache hit");
            Ok(Some(CachedAirQuality {
                city_name,
                aqi,
                level,
                data: serde_json::from_str(&data)?,
                cached_at,
                expires_at,
            }))
        })
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = now_utc().unix_timestamp();
        self.with_db(|db| {
            let result = db.run("DELETE FROM air_quality_cache WHERE expires_at <= ?1", [now])?;
            if result.changes > 0 {
                debug!(removed = result.changes, "Purged expired cache entries");
            }
            Ok(result.changes)
        })
    }

    // === Measurement history ===

    async fn record_measurement(&self, measurement: &NewMeasurement) -> Result<()> {
        let name = validate_city_name(&measurement.city_name)?.to_string();
        let key = city_key(&name);
        let measured_at = measurement
            .measured_at
            .map(truncate_to_seconds)
            .unwrap_or_else(now_utc);
        let p = measurement.pollutants;
        let cap = self.limits.measurements_per_city;

        self.with_db(|db| {
            db.run(
                "INSERT INTO air_quality_history
                    (city_name, city_key, aqi, pm25, pm10, o3, no2, measured_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    name,
                    key,
                    measurement.aqi,
                    p.pm25,
                    p.pm10,
                    p.o3,
                    p.no2,
                    measured_at.unix_timestamp()
                ],
            )?;

            match trim_measurements(db, &key, cap) {
                Ok(0) => {}
                Ok(removed) => debug!(city = %name, removed, "Trimmed measurement history"),
                Err(e) => warn!(city = %name, error = %e, "Failed to trim measurement history"),
            }
            Ok(())
        })
    }

    async fn query_measurements(&self, query: &MeasurementQuery) -> Result<Vec<MeasurementSample>> {
        let sql = query.build_sql();
        let (_, params) = query.build_where();

        self.with_db(|db| {
            let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
            db.query_all(&sql, params_ref.as_slice(), sample_from_row)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, OffsetDateTime};

    fn backend() -> SqliteBackend {
        SqliteBackend::open_in_memory(Limits::default()).unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_favorite_is_case_insensitive() {
        let store = backend();
        store.add_favorite(&NewFavorite::new("Paris")).await.unwrap();

        let err = store
            .add_favorite(&NewFavorite::new("PARIS"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateFavorite(ref name) if name == "PARIS"));
        assert_eq!(store.list_favorites().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_ascii_duplicate_detected() {
        let store = backend();
        store.add_favorite(&NewFavorite::new("Évry")).await.unwrap();
        assert!(
            store
                .add_favorite(&NewFavorite::new("ÉVRY"))
                .await
                .unwrap_err()
                .is_duplicate()
        );
        assert!(store.is_favorite("évry").await.unwrap());
    }

    #[tokio::test]
    async fn test_favorites_limit() {
        let limits = Limits {
            max_favorites: 2,
            ..Limits::default()
        };
        let store = SqliteBackend::open_in_memory(limits).unwrap();
        store.add_favorite(&NewFavorite::new("A")).await.unwrap();
        store.add_favorite(&NewFavorite::new("B")).await.unwrap();

        let err = store.add_favorite(&NewFavorite::new("C")).await.unwrap_err();
        assert!(matches!(err, Error::FavoritesLimitReached(2)));
    }

    #[tokio::test]
    async fn test_update_favorite_fields() {
        let store = backend();
        let id = store
            .add_favorite(&NewFavorite::new("Lyon").country("FR"))
            .await
            .unwrap();

        store
            .update_favorite(id, &FavoriteUpdate::new().latitude(45.76).longitude(4.83))
            .await
            .unwrap();

        let fav = &store.list_favorites().await.unwrap()[0];
        assert_eq!(fav.name, "Lyon");
        assert_eq!(fav.country.as_deref(), Some("FR"));
        assert_eq!(fav.latitude, Some(45.76));
        assert_eq!(fav.longitude, Some(4.83));
    }

    #[tokio::test]
    async fn test_rename_onto_existing_name_fails() {
        let store = backend();
        store.add_favorite(&NewFavorite::new("Paris")).await.unwrap();
        let lyon = store.add_favorite(&NewFavorite::new("Lyon")).await.unwrap();

        let err = store
            .update_favorite(lyon, &FavoriteUpdate::new().name("paris"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());

        // Changing only the case of its own name is allowed
        store
            .update_favorite(lyon, &FavoriteUpdate::new().name("LYON"))
            .await
            .unwrap();
        assert!(store.is_favorite("lyon").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_no_ops() {
        let store = backend();
        store.remove_favorite(999).await.unwrap();
        store
            .update_favorite(999, &FavoriteUpdate::new().name("Ghost"))
            .await
            .unwrap();
        assert!(store.list_favorites().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_cache_row_is_deleted_on_read() {
        let store = backend();
        let entry = CacheEntry::new("Paris", 80, serde_json::json!({"aqi": 80}));
        store.cache_air_quality(&entry, 0).await.unwrap();

        assert!(store.cached_air_quality("Paris").await.unwrap().is_none());
        assert_eq!(store.stats().await.unwrap().cached, 0);
    }

    #[tokio::test]
    async fn test_cache_upsert_replaces_entry() {
        let store = backend();
        store
            .cache_air_quality(&CacheEntry::new("Paris", 40, serde_json::json!(1)), 30)
            .await
            .unwrap();
        store
            .cache_air_quality(&CacheEntry::new("paris", 160, serde_json::json!(2)), 30)
            .await
            .unwrap();

        let hit = store.cached_air_quality("PARIS").await.unwrap().unwrap();
        assert_eq!(hit.aqi, 160);
        assert_eq!(hit.level, "Mauvais");
        assert_eq!(hit.data, serde_json::json!(2));
        assert_eq!(store.stats().await.unwrap().cached, 1);
    }

    #[tokio::test]
    async fn test_purge_expired_counts_rows() {
        let store = backend();
        store
            .cache_air_quality(&CacheEntry::new("Old", 10, serde_json::Value::Null), 0)
            .await
            .unwrap();
        store
            .cache_air_quality(&CacheEntry::new("Fresh", 10, serde_json::Value::Null), 30)
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert!(store.cached_air_quality("Fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_measurement_cap_per_city() {
        let limits = Limits {
            measurements_per_city: 5,
            ..Limits::default()
        };
        let store = SqliteBackend::open_in_memory(limits).unwrap();
        let start = OffsetDateTime::now_utc() - Duration::hours(12);

        for i in 0..6 {
            let m = NewMeasurement::new("Paris", i).measured_at(start + Duration::minutes(i.into()));
            store.record_measurement(&m).await.unwrap();
        }
        store
            .record_measurement(&NewMeasurement::new("Lyon", 1))
            .await
            .unwrap();

        let paris = store.measurement_range("paris", 1).await.unwrap();
        assert_eq!(paris.len(), 5);
        assert_eq!(paris[0].aqi, 1, "oldest sample evicted");
        assert_eq!(store.measurement_range("Lyon", 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_trim_keeps_recorded_measurement() {
        let limits = Limits {
            measurements_per_city: 3,
            ..Limits::default()
        };
        let db = Database::open_in_memory().unwrap();
        db.execute(
            "CREATE TRIGGER block_history_delete BEFORE DELETE ON air_quality_history \
             BEGIN SELECT RAISE(ABORT, 'history is read-only'); END;",
        )
        .unwrap();
        let store = SqliteBackend::with_database(db, limits);
        let start = OffsetDateTime::now_utc() - Duration::hours(1);

        for i in 0..5 {
            let m = NewMeasurement::new("Paris", i).measured_at(start + Duration::minutes(i.into()));
            store
                .record_measurement(&m)
                .await
                .expect("trim failure must not fail the write");
        }

        assert_eq!(store.stats().await.unwrap().measurements, 5);
        assert_eq!(store.measurement_range("Paris", 1).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_query_measurements_pagination() {
        let store = backend();
        let start = OffsetDateTime::now_utc() - Duration::days(1);
        for i in 0..10 {
            let m = NewMeasurement::new("Oslo", i * 10)
                .pollutants(Pollutants::new().pm25(f64::from(i)))
                .measured_at(start + Duration::minutes(i.into()));
            store.record_measurement(&m).await.unwrap();
        }

        let page = store
            .query_measurements(&MeasurementQuery::new().city("oslo").newest_first().limit(3).offset(1))
            .await
            .unwrap();
        let aqis: Vec<i32> = page.iter().map(|s| s.aqi).collect();
        assert_eq!(aqis, vec![80, 70, 60]);
        assert_eq!(page[0].pollutants.pm25, Some(8.0));
    }

    #[tokio::test]
    async fn test_closed_backend_rejects_operations() {
        let store = backend();
        store.close().await.unwrap();
        assert!(matches!(
            store.list_favorites().await.unwrap_err(),
            Error::Closed
        ));
        // Closing twice is fine
        store.close().await.unwrap();
    }
}
