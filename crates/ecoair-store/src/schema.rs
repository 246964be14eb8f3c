//! Database schema.

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Tables holding app data, in drop order.
pub const DATA_TABLES: [&str; 4] = [
    "favorites",
    "search_history",
    "air_quality_cache",
    "air_quality_history",
];

/// Initialize the database schema.
///
/// Older databases are not migrated; the version row is only recorded.
pub fn initialize(conn: &Connection) -> Result<()> {
    create_tables(conn)?;
    if get_schema_version(conn)? == 0 {
        set_schema_version(conn, SCHEMA_VERSION)?;
    }
    Ok(())
}

/// Get the current schema version.
pub(crate) fn get_schema_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| {
            row.get(0)
        })
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
        [version],
    )?;
    Ok(())
}

/// Create every table and index that does not exist yet.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        -- Bookmarked cities
        CREATE TABLE IF NOT EXISTS favorites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            name_key TEXT NOT NULL UNIQUE,
            country TEXT,
            latitude REAL,
            longitude REAL,
            added_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_favorites_name ON favorites(name);

        -- Search log, newest first by searched_at
        CREATE TABLE IF NOT EXISTS search_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            city_name TEXT NOT NULL,
            city_key TEXT NOT NULL,
            searched_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_search_history_city ON search_history(city_name);

        -- AQI responses with expiry
        CREATE TABLE IF NOT EXISTS air_quality_cache (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            city_name TEXT NOT NULL,
            city_key TEXT NOT NULL UNIQUE,
            aqi INTEGER NOT NULL,
            level TEXT NOT NULL,
            data TEXT NOT NULL,
            cached_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_air_quality_cache_city ON air_quality_cache(city_name);

        -- Per-city measurement series
        CREATE TABLE IF NOT EXISTS air_quality_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            city_name TEXT NOT NULL,
            city_key TEXT NOT NULL,
            aqi INTEGER NOT NULL,
            pm25 REAL,
            pm10 REAL,
            o3 REAL,
            no2 REAL,
            measured_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_air_quality_history_city_time
            ON air_quality_history(city_key, measured_at);
        "#,
    )?;
    Ok(())
}

/// Drop the data tables. `schema_version` is kept.
pub fn drop_tables(conn: &Connection) -> Result<()> {
    for table in DATA_TABLES {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
    }
    Ok(())
}
