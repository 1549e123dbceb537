use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::models::Catalog;

/// A string-valued key-value slot that survives restarts.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per key below a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        Ok(())
    }
}

/// In-process store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: impl Into<String>) -> Self {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).insert(key.to_string(), value.into());
        self
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads a persisted catalog. An absent or empty slot is `Ok(None)`.
pub fn read_catalog(store: &dyn LocalStore, key: &str) -> Result<Option<Catalog>> {
    match store.get(key)? {
        Some(text) if !text.is_empty() => Ok(Some(serde_json::from_str(&text)?)),
        _ => Ok(None),
    }
}

pub fn write_catalog(store: &dyn LocalStore, key: &str, catalog: &Catalog) -> Result<()> {
    store.set(key, &serde_json::to_string(catalog)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CatalogError, FilmItem};

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "{\"films\":[]}").unwrap();
        assert!(store.path("k").ends_with("k.json"));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("{\"films\":[]}"));
    }

    #[test]
    fn read_catalog_fills_missing_lists() {
        let store = MemoryStore::new().with_entry("c", r#"{"films":[{"id":"a","title":"A"}]}"#);
        let catalog = read_catalog(&store, "c").unwrap().unwrap();
        assert_eq!(catalog.films[0].duration, "-");
        assert!(catalog.series.is_empty());
    }

    #[test]
    fn read_catalog_reports_corruption() {
        let store = MemoryStore::new().with_entry("c", "{oops");
        assert!(matches!(read_catalog(&store, "c"), Err(CatalogError::Decode(_))));
        let store = MemoryStore::new().with_entry("c", "");
        assert_eq!(read_catalog(&store, "c").unwrap(), None);
    }

    #[test]
    fn write_then_read() {
        let store = MemoryStore::new();
        let mut catalog = Catalog::default();
        catalog.films.push(FilmItem { id: "x".into(), ..Default::default() });
        write_catalog(&store, "c", &catalog).unwrap();
        assert_eq!(read_catalog(&store.clone(), "c").unwrap(), Some(catalog));
    }
}
