use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is not a json object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable per-origin key-value store, the shape of `localStorage`.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store. Clones share the same entries, so a caller can keep a
/// handle to inspect what a page wrote.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryStore {
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes.set(self.writes.get() + 1);
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON object per file, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value.to_string());
        let json = serde_json::to_vec_pretty(&next)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, json)?;
        self.entries = next;
        Ok(())
    }
}

/// A store that is always unavailable, as in a private browsing window with
/// storage disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledStore;

impl PreferenceStore for DisabledStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }
}

/// Wraps a backing store so failures never escape: reads that fail count as
/// "unset" and writes that fail are kept in memory for the rest of the session.
pub struct ResilientStore {
    inner: Box<dyn PreferenceStore>,
    shadow: BTreeMap<String, String>,
}

impl ResilientStore {
    pub fn new(inner: impl PreferenceStore + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            shadow: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(v) = self.shadow.get(key) {
            return Some(v.clone());
        }
        match self.inner.get(key) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key, error = %e, "preference read failed; treating as unset");
                None
            }
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.inner.set(key, value) {
            Ok(()) => {
                self.shadow.remove(key);
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "preference write failed; keeping it in memory");
                self.shadow.insert(key.to_string(), value.to_string());
            }
        }
    }
}

impl Default for ResilientStore {
    fn default() -> Self {
        Self::new(MemoryStore::default())
    }
}
