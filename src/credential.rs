//! API key storage.
//!
//! The key lives in a tiny key/value store so it survives restarts. Nothing
//! else is persisted.

use crate::error::{Result, StudioError};
use crate::i18n::Translator;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage key under which the API key is persisted.
pub const API_KEY_STORAGE_KEY: &str = "gemini_api_key";

/// File name of the persisted key/value store inside the data directory.
const STORAGE_FILE_NAME: &str = "storage.json";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ARCHSTUDIO_HOME";

/// Persistent string key/value storage.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// JSON-file backed store (`<dir>/storage.json`).
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens the store in `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORAGE_FILE_NAME),
            write_lock: Mutex::new(()),
        }
    }

    /// Opens the store in the default data directory.
    ///
    /// Uses `$ARCHSTUDIO_HOME` when set, otherwise `<config dir>/archstudio`.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(default_data_dir()?))
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write to a sibling then rename so a crash never leaves a torn file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = lock(&self.write_lock);
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = lock(&self.write_lock);
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Resolves the data directory: `$ARCHSTUDIO_HOME`, else `<config dir>/archstudio`.
pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|d| d.join("archstudio"))
        .ok_or_else(|| {
            StudioError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine config directory",
            ))
        })
}

/// Holds the API key and keeps it in sync with the backing store.
pub struct CredentialStore {
    backend: Box<dyn KeyValueStore>,
    current: Mutex<Option<String>>,
}

impl CredentialStore {
    /// Creates a store over `backend`, loading any persisted key.
    pub fn load(backend: impl KeyValueStore + 'static) -> Result<Self> {
        let current = backend.get(API_KEY_STORAGE_KEY)?;
        tracing::debug!(present = current.is_some(), "loaded stored API key");
        Ok(Self {
            backend: Box::new(backend),
            current: Mutex::new(current),
        })
    }

    /// Returns the stored key, if any.
    pub fn get(&self) -> Option<String> {
        lock(&self.current).clone()
    }

    /// Returns true if a key is stored.
    pub fn is_set(&self) -> bool {
        lock(&self.current).is_some()
    }

    /// Persists `secret` and makes it visible to all readers.
    pub fn set(&self, secret: impl Into<String>) -> Result<()> {
        let secret = secret.into();
        self.backend.set(API_KEY_STORAGE_KEY, &secret)?;
        *lock(&self.current) = Some(secret);
        tracing::info!("API key stored");
        Ok(())
    }

    /// Removes the key from memory and from the backing store.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove(API_KEY_STORAGE_KEY)?;
        *lock(&self.current) = None;
        tracing::info!("API key cleared");
        Ok(())
    }

    /// Handles the setup prompt's "save" action.
    ///
    /// A blank entry is rejected with the localized validation message and
    /// nothing is stored.
    pub fn submit_setup(&self, entry: &str, t: &Translator) -> std::result::Result<(), String> {
        if entry.trim().is_empty() {
            return Err(t.lookup("api_key_modal_error").to_string());
        }
        self.set(entry).map_err(|e| e.user_message(t))
    }

    /// Returns the key with all but its first characters hidden.
    pub fn masked(&self) -> Option<String> {
        self.get().map(|key| mask(&key))
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("key", &self.masked())
            .finish()
    }
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{visible}…")
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
