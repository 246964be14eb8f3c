//! Error types for ecoair-store.

use std::path::PathBuf;

use ecoair_types::ValidationError;

/// Result type for ecoair-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ecoair-store.
///
/// Two families matter to callers:
///
/// - Declined operations ([`Error::DuplicateFavorite`], [`Error::FavoritesLimitReached`],
///   [`Error::Validation`]) leave storage untouched and deserve an informative notice.
/// - Storage failures (see [`Error::is_storage`]) are worth a generic "try again" notice.
///
/// Removing or updating an id that does not exist is never an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A favorite with the same name (ignoring case) already exists.
    #[error("City already in favorites: {0}")]
    DuplicateFavorite(String),

    /// The favorites registry is full.
    #[error("Favorites limit reached ({0} cities)")]
    FavoritesLimitReached(usize),

    /// Caller-supplied value rejected before reaching storage.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Database error from SQLite.
    #[cfg(not(target_arch = "wasm32"))]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create the data directory.
    #[error("Failed to create data directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Key/value backend failure.
    #[error("Key/value storage error: {0}")]
    KeyValue(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend has been closed.
    #[error("Storage has been closed")]
    Closed,

    /// The process-wide storage has not been initialized.
    #[error("Storage not initialized; call ecoair_store::init first")]
    NotInitialized,

    /// The requested backend is not available on this platform.
    #[error("Unsupported on this platform: {0}")]
    Unsupported(&'static str),
}

impl Error {
    /// Whether this is an underlying storage failure rather than a declined request.
    pub fn is_storage(&self) -> bool {
        !matches!(
            self,
            Error::DuplicateFavorite(_)
                | Error::FavoritesLimitReached(_)
                | Error::Validation(_)
                | Error::NotInitialized
                | Error::Unsupported(_)
        )
    }

    /// Whether the request was declined because the favorite already exists.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::DuplicateFavorite(_))
    }
}
