//! Directory-backed key/value store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::KeyValueStore;
use crate::error::{Error, Result};

const EXTENSION: &str = "kv";

/// Key/value store keeping one file per key inside a directory.
///
/// The directory is created on first write. Keys are percent-escaped into
/// file names, so any string is a valid key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{EXTENSION}", escape_key(key)))
    }

    async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::CreateDirectory {
                path: self.dir.clone(),
                source: e,
            })
    }
}

/// Escape a key into a portable file stem.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Reverse of [`escape_key`]. Returns `None` for names this store did not write.
fn unescape_key(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = stem.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_dir().await?;
        let path = self.path_for(key);
        // Write then rename so readers never see a partial value
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        debug!(key, path = %path.display(), "Stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(key) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(unescape_key)
            {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_escape_roundtrip() {
        for key in ["ecoair:favorites", "plain", "with space/and.dot", "Zürich"] {
            let escaped = escape_key(key);
            assert!(!escaped.contains(['/', ':', '.', ' ']));
            assert_eq!(unescape_key(&escaped).as_deref(), Some(key));
        }
    }

    #[test]
    fn test_unescape_rejects_garbage() {
        assert!(unescape_key("bad%G1").is_none());
        assert!(unescape_key("trunc%4").is_none());
    }

    #[tokio::test]
    async fn test_missing_directory_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("not-yet"));
        assert!(store.get("anything").await.unwrap().is_none());
        assert!(store.list_keys().await.unwrap().is_empty());
        store.remove("anything").await.unwrap();
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileStore::new(dir.path());
            store.set("ecoair:favorites", "[]").await.unwrap();
            store.set("ecoair:last_city", "\"Nice\"").await.unwrap();
        }

        let store = FileStore::new(dir.path());
        assert_eq!(
            store.get("ecoair:favorites").await.unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(
            store.list_keys().await.unwrap(),
            vec!["ecoair:favorites", "ecoair:last_city"]
        );
    }

    #[tokio::test]
    async fn test_foreign_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let store = FileStore::new(dir.path());
        store.set("k", "v").await.unwrap();
        assert_eq!(store.list_keys().await.unwrap(), vec!["k"]);
    }
}
