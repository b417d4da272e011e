//! Persisted key/value storage for console state

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::AdminResult;

/// File name of the store inside the data folder
pub const STORE_FILE: &str = "session.json";

/// String values under string keys
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AdminResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> AdminResult<()>;

    fn remove(&self, key: &str) -> AdminResult<()>;
}

/// JSON object on disk
///
/// A file that is missing or does not hold a JSON object reads as empty and
/// is overwritten by the next write.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_folder(data_folder: &Path) -> Self {
        Self::new(data_folder.join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> AdminResult<Map<String, Value>> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            _ => {
                warn!(path = %self.path.display(), "Session store unreadable, treating as empty");
                Ok(Map::new())
            }
        }
    }

    fn write_map(&self, map: Map<String, Value>) -> AdminResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(roster_common::Error::from)?;
        std::fs::write(&self.path, content)?;
        debug!(path = %self.path.display(), "Session store written");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> AdminResult<Option<String>> {
        Ok(self
            .read_map()?
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> AdminResult<()> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_map(map)
    }

    fn remove(&self, key: &str) -> AdminResult<()> {
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(map)?;
        }
        Ok(())
    }
}

/// In-process store for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AdminResult<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AdminResult<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AdminResult<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}
