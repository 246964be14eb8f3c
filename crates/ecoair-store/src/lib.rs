//! Local persistence for the Eco-Air air quality app.
//!
//! This crate owns every piece of state the app keeps on the device:
//! bookmarked cities, the search log, cached AQI responses, per-city
//! measurement history and user preferences. A [`StorageFacade`] selects one
//! backend per process:
//!
//! - **Relational** (native default): SQLite through `rusqlite`
//! - **Key/value** (browser default): JSON blobs in a [`kv::KeyValueStore`]
//!
//! Both backends enforce the same rules: case-insensitive uniqueness of
//! favorites, a capped and de-duplicated search log, TTL expiry of cached
//! responses and a per-city cap on measurements. The key/value backend does
//! not persist the cache or measurements.
//!
//! # Example
//!
//! ```
//! use ecoair_store::{BackendChoice, CacheEntry, NewFavorite, StorageFacade, StoreConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ecoair_store::Result<()> {
//! let storage = StorageFacade::open(&StoreConfig::in_memory(BackendChoice::Relational)).await?;
//!
//! storage.add_favorite(&NewFavorite::new("Tokyo").country("JP")).await?;
//! assert!(storage.is_favorite("tokyo").await?);
//!
//! storage.record_search("Tokyo").await?;
//! storage
//!     .cache_air_quality(&CacheEntry::new("Tokyo", 42, serde_json::json!({"aqi": 42})))
//!     .await?;
//! assert_eq!(storage.cached_air_quality("TOKYO").await?.unwrap().level, "Bon");
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
mod error;
mod facade;
mod kv_backend;
mod models;
mod preferences;
mod queries;
mod retention;

pub mod kv;

#[cfg(not(target_arch = "wasm32"))]
mod database;
#[cfg(not(target_arch = "wasm32"))]
mod schema;
#[cfg(not(target_arch = "wasm32"))]
mod sqlite;

pub use backend::StorageBackend;
pub use config::{
    BackendChoice, BackendKind, DATABASE_FILE, Limits, Platform, StoreConfig, default_data_dir,
};
pub use error::{Error, Result};
pub use facade::{StorageFacade, close, global, init, open_backend};
pub use kv_backend::KeyValueBackend;
pub use models::{
    CacheEntry, CachedAirQuality, FavoriteCity, FavoriteUpdate, MeasurementSample, NewFavorite,
    NewMeasurement, StorageStats,
};
pub use preferences::Preferences;
pub use queries::MeasurementQuery;

#[cfg(not(target_arch = "wasm32"))]
pub use database::{Database, RunResult};
#[cfg(not(target_arch = "wasm32"))]
pub use sqlite::SqliteBackend;

pub use ecoair_types::{AqiLevel, Coordinates, NotificationSettings, Pollutants};
