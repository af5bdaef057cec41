//! Durable client-side key/value storage.
//!
//! Stands in for browser local storage: string keys, string (JSON) values.
//! Records that carry structure are wrapped in a `{ version, payload }`
//! envelope and migrated on read. Anything that fails to parse falls back to
//! the caller's default instead of surfacing an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Key/value persistence shared by controllers and session configuration.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

fn poisoned() -> CoreError {
    CoreError::Storage("store lock poisoned".to_string())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store; contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Store backed by a single JSON object file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename. A missing or unreadable file reads as empty.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> HashMap<String, String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read store file");
                return HashMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Ignoring malformed store file");
            HashMap::new()
        })
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| CoreError::Storage(format!("serialize store: {e}")))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| CoreError::Storage(format!("write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| CoreError::Storage(format!("rename to {}: {e}", self.path.display())))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        Ok(self.read_all().remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut entries = self.read_all();
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        let mut entries = self.read_all();
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Versioned records
// ---------------------------------------------------------------------------

/// Envelope written around structured payloads.
#[derive(Debug, Serialize, Deserialize)]
struct Versioned<T> {
    version: u32,
    payload: T,
}

/// Load a versioned record.
///
/// * `{ "version": current, "payload": ... }` parses as `T`.
/// * A bare payload with no envelope (records written before versioning)
///   is migrated by parsing it directly as `T`.
/// * Any other version, malformed JSON, or a store error yields `None`.
pub fn load_versioned<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    current_version: u32,
) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read persisted record");
            return None;
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring malformed persisted record");
            return None;
        }
    };

    let is_envelope = value
        .as_object()
        .is_some_and(|o| o.contains_key("version") && o.contains_key("payload"));

    if !is_envelope {
        return serde_json::from_value(value)
            .map_err(|e| tracing::warn!(key, error = %e, "Unversioned record did not migrate"))
            .ok();
    }

    match serde_json::from_value::<Versioned<T>>(value) {
        Ok(record) if record.version == current_version => Some(record.payload),
        Ok(record) => {
            tracing::warn!(
                key,
                found = record.version,
                expected = current_version,
                "Discarding persisted record with unknown version"
            );
            None
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring persisted record with bad payload");
            None
        }
    }
}

/// Write `payload` under `key` wrapped in a versioned envelope.
pub fn save_versioned<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    version: u32,
    payload: &T,
) -> Result<(), CoreError> {
    let json = serde_json::to_string(&Versioned { version, payload })
        .map_err(|e| CoreError::Storage(format!("serialize {key}: {e}")))?;
    store.set(key, &json)
}
