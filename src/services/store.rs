//! Key-value persistence of whole JSON documents
//!
//! Each logical collection lives under one key and is always written in
//! full. There are no partial updates and no cross-key transactions.

use std::{
    collections::HashMap,
    fmt,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{CompanionError, Result};

/// Logical names of the persisted collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Recipes,
    Alarms,
    Timers,
    Stopwatch,
    Settings,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Recipes => "recipes",
            StorageKey::Alarms => "alarms",
            StorageKey::Timers => "timers",
            StorageKey::Stopwatch => "stopwatch",
            StorageKey::Settings => "settings",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-document key-value store
pub trait Store: Send + Sync {
    fn read(&self, key: StorageKey) -> Result<Option<String>>;
    fn write(&self, key: StorageKey, json: &str) -> Result<()>;
}

/// Read and decode a collection, `None` when the key was never written
pub fn load<T: DeserializeOwned>(store: &dyn Store, key: StorageKey) -> Result<Option<T>> {
    match store.read(key)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// Encode and write a full collection snapshot
pub fn save<T: Serialize + ?Sized>(store: &dyn Store, key: StorageKey, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    store.write(key, &json)
}

/// One `<key>.json` file per collection inside a data directory
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Store for JsonFileStore {
    fn read(&self, key: StorageKey) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CompanionError::Storage(e)),
        }
    }

    fn write(&self, key: StorageKey, json: &str) -> Result<()> {
        // Write beside the target and rename so readers never see a torn file.
        let target = self.path_for(key);
        let staging = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&staging, json)?;
        fs::rename(&staging, &target)?;
        debug!("Wrote {} ({} bytes)", target.display(), json.len());
        Ok(())
    }
}

/// In-process store for tests and `--ephemeral` runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<StorageKey, String>>,
    read_only: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, to exercise degraded mode
    pub fn set_read_only(&self, read_only: bool) {
        if let Ok(mut flag) = self.read_only.lock() {
            *flag = read_only;
        }
    }

    pub fn contains(&self, key: StorageKey) -> bool {
        self.documents
            .lock()
            .map(|docs| docs.contains_key(&key))
            .unwrap_or(false)
    }
}

impl Store for MemoryStore {
    fn read(&self, key: StorageKey) -> Result<Option<String>> {
        let docs = self
            .documents
            .lock()
            .map_err(|_| CompanionError::StatePoisoned("memory store"))?;
        Ok(docs.get(&key).cloned())
    }

    fn write(&self, key: StorageKey, json: &str) -> Result<()> {
        let read_only = self.read_only.lock().map(|flag| *flag).unwrap_or(false);
        if read_only {
            return Err(CompanionError::Storage(std::io::Error::new(
                ErrorKind::PermissionDenied,
                format!("store is read-only, {} not saved", key),
            )));
        }
        let mut docs = self
            .documents
            .lock()
            .map_err(|_| CompanionError::StatePoisoned("memory store"))?;
        docs.insert(key, json.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[test]
    fn file_store_round_trips_whole_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("data")).unwrap();

        assert!(load::<Vec<Doc>>(&store, StorageKey::Recipes).unwrap().is_none());

        let docs = vec![Doc { name: "scones".into(), count: 2 }];
        save(&store, StorageKey::Recipes, &docs).unwrap();

        let loaded: Vec<Doc> = load(&store, StorageKey::Recipes).unwrap().unwrap();
        assert_eq!(loaded, docs);
        assert!(dir.path().join("data").join("recipes.json").exists());
        assert!(!dir.path().join("data").join(".recipes.json.tmp").exists());
    }

    #[test]
    fn corrupt_documents_surface_as_serialization_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.write(StorageKey::Alarms, "{not json").unwrap();

        let err = load::<Vec<Doc>>(&store, StorageKey::Alarms).unwrap_err();
        assert!(matches!(err, CompanionError::Serialization(_)));
    }

    #[test]
    fn read_only_memory_store_rejects_writes() {
        let store = MemoryStore::new();
        store.set_read_only(true);
        assert!(save(&store, StorageKey::Timers, &Vec::<Doc>::new()).is_err());
        assert!(!store.contains(StorageKey::Timers));

        store.set_read_only(false);
        save(&store, StorageKey::Timers, &Vec::<Doc>::new()).unwrap();
        assert!(store.contains(StorageKey::Timers));
    }
}
