//! Local persistent storage for cart state.
//!
//! The storefront persists exactly two string keys: the serialized local
//! cart line list and the remote cart id. Absence of a key means "no cart
//! yet", never an error. Reads and writes are synchronous and
//! last-write-wins; nothing guards against a second process touching the
//! same file.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

/// Storage keys used by the cart synchronizer.
pub mod keys {
    /// Key for the serialized local cart line list.
    pub const CART_LINES: &str = "cart.lines";

    /// Key for the remote cart id.
    pub const CART_REMOTE_ID: &str = "cart.remote_id";
}

/// Errors that can occur opening a store.
///
/// Writes are deliberately infallible at the API level: storage is
/// best-effort and a failed write must never abort a cart mutation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage directory could not be created.
    #[error("failed to create storage directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// String key/value storage for the storefront's local state.
pub trait LocalStore {
    /// Read a key. `None` means the key has never been written (or was
    /// removed), not an error.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a key, replacing any previous value. Best-effort.
    fn put(&mut self, key: &str, value: &str);

    /// Remove a key if present. Best-effort.
    fn remove(&mut self, key: &str);
}

/// File-backed store: one JSON object per store file.
///
/// The whole map is rewritten on every mutation. Write failures are logged
/// and swallowed - the in-memory view stays authoritative for the life of
/// the process.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    const FILE_NAME: &'static str = "storefront.json";

    /// Open (or create) the store under `dir`.
    ///
    /// An unreadable or unparseable store file is treated as empty: local
    /// state is a cache of remote truth, so starting over is safe.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::CreateDir` if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDir {
            path: dir.display().to_string(),
            source,
        })?;

        let path = dir.join(Self::FILE_NAME);
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Discarding unparseable store file {}: {e}", path.display());
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        Ok(Self { path, entries })
    }

    fn persist(&self) {
        match serde_json::to_string_pretty(&self.entries) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    tracing::warn!("Failed to write store file {}: {e}", self.path.display());
                }
            }
            Err(e) => {
                tracing::warn!("Failed to serialize store contents: {e}");
            }
        }
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
        self.persist();
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.persist();
        }
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}
