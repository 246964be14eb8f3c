//! Storage configuration.
//!
//! [`StoreConfig`] is plain data with serde derives so that front ends can
//! embed it in their own config files (the CLI keeps it under `[storage]`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Platform the process is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Desktop, server or mobile native target.
    Native,
    /// Browser (`wasm32`).
    Web,
}

impl Platform {
    /// Platform of the current build target.
    pub const fn current() -> Self {
        if cfg!(target_arch = "wasm32") {
            Platform::Web
        } else {
            Platform::Native
        }
    }
}

/// Which backend to use, as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendChoice {
    /// Relational on native targets, key/value on the web.
    #[default]
    Auto,
    /// Force the SQLite backend.
    Relational,
    /// Force the key/value backend.
    KeyValue,
}

/// Concrete backend selected for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Relational,
    KeyValue,
}

impl BackendChoice {
    /// Resolve the configured choice against a platform.
    pub fn resolve(self, platform: Platform) -> BackendKind {
        match (self, platform) {
            (BackendChoice::Relational, _) => BackendKind::Relational,
            (BackendChoice::KeyValue, _) => BackendKind::KeyValue,
            (BackendChoice::Auto, Platform::Native) => BackendKind::Relational,
            (BackendChoice::Auto, Platform::Web) => BackendKind::KeyValue,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Relational => write!(f, "relational"),
            BackendKind::KeyValue => write!(f, "key-value"),
        }
    }
}

/// Retention caps and defaults applied by the facade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of favorite cities.
    pub max_favorites: usize,
    /// Entries kept in the search history log.
    pub search_history_cap: usize,
    /// Default number of entries returned by `recent_searches`.
    pub recent_searches: usize,
    /// Samples kept per city in the measurement history.
    pub measurements_per_city: usize,
    /// Default cache lifetime.
    pub cache_ttl_minutes: i64,
    /// Default trailing window for measurement ranges.
    pub range_days: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_favorites: 50,
            search_history_cap: 50,
            recent_searches: 10,
            measurements_per_city: 1000,
            cache_ttl_minutes: 30,
            range_days: 7,
        }
    }
}

/// Configuration for [`StorageFacade::open`](crate::StorageFacade::open).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend selection.
    pub backend: BackendChoice,
    /// Directory holding the database and the key/value files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Keep everything in memory (tests, throwaway sessions).
    pub in_memory: bool,
    /// Prefix of every key written to the key/value store.
    pub namespace: String,
    /// Retention caps and defaults.
    pub limits: Limits,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendChoice::Auto,
            data_dir: None,
            in_memory: false,
            namespace: "ecoair".to_string(),
            limits: Limits::default(),
        }
    }
}

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "ecoair.db";

/// Sub-directory of the data directory holding key/value files.
pub const KV_DIR: &str = "kv";

impl StoreConfig {
    /// In-memory configuration for the given backend.
    pub fn in_memory(backend: BackendChoice) -> Self {
        Self {
            backend,
            in_memory: true,
            ..Self::default()
        }
    }

    /// Configuration rooted at a directory.
    pub fn at(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    /// Set the backend choice.
    pub fn with_backend(mut self, backend: BackendChoice) -> Self {
        self.backend = backend;
        self
    }

    /// Backend selected for the current platform.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.resolve(Platform::current())
    }

    /// Effective data directory.
    ///
    /// - Linux: `~/.local/share/ecoair`
    /// - macOS: `~/Library/Application Support/ecoair`
    /// - Windows: `C:\Users\<user>\AppData\Local\ecoair`
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// Path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(DATABASE_FILE)
    }

    /// Directory used by the file-backed key/value store.
    pub fn kv_dir(&self) -> PathBuf {
        self.data_dir().join(KV_DIR)
    }
}

/// Default data directory following platform conventions.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ecoair")
}
