use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;

/// Storage key for the persisted session (user, token, authenticated flag).
pub const SESSION_KEY: &str = "auth-storage";
/// Storage key for the persisted UI preferences (locale, theme, sidebar).
pub const UI_KEY: &str = "ui-storage";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error for state key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize state key {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable key/value storage for the small amount of state that survives a
/// restart. Values are JSON documents.
pub trait StateStorage: Send + Sync + 'static {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode `key`. A missing or unreadable entry yields `None`; a
/// corrupt entry is logged and treated as missing.
pub fn load_json<T: DeserializeOwned>(storage: &dyn StateStorage, key: &str) -> Option<T> {
    let raw = match storage.load(key) {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(target: "portal::store", key, error = %e, "Failed to read persisted state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                target: "portal::store",
                key,
                error = %e,
                "Persisted state is corrupt. Using defaults."
            );
            None
        }
    }
}

pub fn save_json<T: Serialize>(
    storage: &dyn StateStorage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })?;
    storage.save(key, &raw)
}

/// One JSON file per key inside a directory. Writes go to a temporary file
/// in the same directory that is then renamed over the target, so a crash
/// never leaves a half-written entry.
pub struct FileStateStorage {
    dir: PathBuf,
}

impl FileStateStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source,
    }
}

impl StateStorage for FileStateStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error(key, e))?;
        let mut file =
            tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| io_error(key, e))?;
        file.write_all(value.as_bytes())
            .and_then(|()| file.as_file().sync_all())
            .map_err(|e| io_error(key, e))?;
        file.persist(self.path_for(key))
            .map_err(|e| io_error(key, e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, e)),
        }
    }
}

/// Process-local storage, used by tests and one-shot commands.
#[derive(Default)]
pub struct MemoryStateStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStateStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl StateStorage for MemoryStateStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn file_storage_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStateStorage::new(dir.path().join("state"));

        assert_eq!(storage.load("missing").unwrap(), None);

        let sample = Sample {
            name: "x".into(),
            count: 2,
        };
        save_json(&storage, "sample", &sample).unwrap();
        assert!(dir.path().join("state").join("sample.json").exists());
        assert_eq!(load_json::<Sample>(&storage, "sample"), Some(sample));

        storage.remove("sample").unwrap();
        storage.remove("sample").unwrap();
        assert_eq!(load_json::<Sample>(&storage, "sample"), None);
    }

    #[test]
    fn file_storage_replaces_entries_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStateStorage::new(dir.path());

        storage.save("ui-storage", r#"{"theme":"dark"}"#).unwrap();
        storage.save("ui-storage", r#"{"theme":"light"}"#).unwrap();

        assert_eq!(
            storage.load("ui-storage").unwrap().as_deref(),
            Some(r#"{"theme":"light"}"#)
        );
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("ui-storage.json")]);
    }

    #[test]
    fn corrupt_entries_load_as_missing() {
        let storage = MemoryStateStorage::new();
        storage.save("sample", "{not json").unwrap();
        assert_eq!(load_json::<Sample>(&storage, "sample"), None);
    }
}
