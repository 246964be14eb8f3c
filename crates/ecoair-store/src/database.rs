//! Thin synchronous wrapper around a SQLite connection.

use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Params, Row, Transaction};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::schema;

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    /// Rowid of the last inserted row on this connection.
    pub last_insert_id: i64,
    /// Rows changed by the statement.
    pub changes: usize,
}

/// SQLite database holding the app tables.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Run one or more statements that return nothing (DDL, pragmas).
    pub fn execute(&self, sql: &str) -> Result<()> {
        debug!(sql, "execute");
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Run a single parameterised write.
    pub fn run<P: Params>(&self, sql: &str, params: P) -> Result<RunResult> {
        debug!(sql, "run");
        let changes = self.conn.execute(sql, params)?;
        Ok(RunResult {
            last_insert_id: self.conn.last_insert_rowid(),
            changes,
        })
    }

    /// Collect every row of a query.
    pub fn query_all<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// First row of a query, if any.
    pub fn query_one<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        Ok(self.conn.query_row(sql, params, map).optional()?)
    }

    /// Run `f` inside a transaction, committing when it returns `Ok`.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Number of rows in a table.
    pub fn count(&self, table: &str) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Create any missing table or index.
    pub fn ensure_schema(&self) -> Result<()> {
        schema::initialize(&self.conn)
    }

    /// Drop and recreate the app tables.
    pub fn recreate_tables(&self) -> Result<()> {
        schema::drop_tables(&self.conn)?;
        schema::create_tables(&self.conn)
    }
}

/// Read a unix-seconds column as a UTC timestamp.
pub(crate) fn column_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<OffsetDateTime> {
    let secs: i64 = row.get(idx)?;
    OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

/// Map a UNIQUE violation to `on_conflict`, leaving other errors untouched.
pub(crate) fn map_unique_violation(err: Error, on_conflict: impl FnOnce() -> Error) -> Error {
    match err {
        Error::Database(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            on_conflict()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_reports_insert_id_and_changes() {
        let db = Database::open_in_memory().unwrap();
        let first = db
            .run(
                "INSERT INTO search_history (city_name, city_key, searched_at) VALUES (?1, ?2, ?3)",
                rusqlite::params!["Paris", "paris", 10],
            )
            .unwrap();
        let second = db
            .run(
                "INSERT INTO search_history (city_name, city_key, searched_at) VALUES (?1, ?2, ?3)",
                rusqlite::params!["Lyon", "lyon", 11],
            )
            .unwrap();
        assert_eq!(first.changes, 1);
        assert!(second.last_insert_id > first.last_insert_id);

        let deleted = db.run("DELETE FROM search_history", []).unwrap();
        assert_eq!(deleted.changes, 2);
    }

    #[test]
    fn test_query_one_absent() {
        let db = Database::open_in_memory().unwrap();
        let row: Option<String> = db
            .query_one("SELECT name FROM favorites WHERE id = ?", [42], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(row.is_none());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut db = Database::open_in_memory().unwrap();
        let result: Result<()> = db.transaction(|tx| {
            tx.execute(
                "INSERT INTO search_history (city_name, city_key, searched_at) VALUES ('A', 'a', 1)",
                [],
            )?;
            Err(Error::KeyValue("boom".into()))
        });
        assert!(result.is_err());
        assert_eq!(db.count("search_history").unwrap(), 0);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("ecoair.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.count("favorites").unwrap(), 0);
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ecoair.db");
        {
            let db = Database::open(&path).unwrap();
            db.execute(
                "INSERT INTO favorites (name, name_key, added_at, updated_at) VALUES ('Oslo', 'oslo', 0, 0)",
            )
            .unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.count("favorites").unwrap(), 1);
    }

    #[test]
    fn test_column_time_rejects_out_of_range() {
        let db = Database::open_in_memory().unwrap();
        let result = db.query_one("SELECT ?1", [i64::MAX], |row| column_time(row, 0));
        assert!(matches!(result, Err(Error::Database(_))));
    }
}
