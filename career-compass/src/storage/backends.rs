//! Key-value storage backends
//!
//! - [`MemoryStore`]: shared in-process map with optional quota and fault injection
//! - [`FileStore`]: one JSON file per key under a data directory
//!
//! The SQLite backend lives in [`super::database`].

use career_compass_sdk::{BackendError, KeyValueStore};
use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug)]
struct MemoryState {
    entries: BTreeMap<String, String>,
    /// Maximum total bytes across keys and values
    quota_bytes: Option<usize>,
    available: bool,
    /// Errors returned by upcoming writes, in order
    pending_failures: VecDeque<BackendError>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            quota_bytes: None,
            available: true,
            pending_failures: VecDeque::new(),
        }
    }
}

impl MemoryState {
    fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

/// In-memory backend; clones share the same underlying map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        let store = Self::new();
        store.set_quota(Some(quota_bytes));
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_quota(&self, quota_bytes: Option<usize>) {
        self.lock().quota_bytes = quota_bytes;
    }

    /// Simulate storage being missing entirely
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Make the next write fail with `error`
    pub fn fail_next_write(&self, error: BackendError) {
        self.lock().pending_failures.push_back(error);
    }

    /// Write without quota or validation checks
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock()
            .entries
            .insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    pub fn used_bytes(&self) -> usize {
        self.lock().used_bytes()
    }
}

fn unavailable() -> BackendError {
    BackendError::Unavailable("in-memory store disabled".to_string())
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let state = self.lock();
        if !state.available {
            return Err(unavailable());
        }
        Ok(state.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut state = self.lock();
        if !state.available {
            return Err(unavailable());
        }
        if let Some(err) = state.pending_failures.pop_front() {
            return Err(err);
        }
        if let Some(quota) = state.quota_bytes {
            let existing = state.entries.get(key).map_or(0, |v| key.len() + v.len());
            let projected = state.used_bytes() - existing + key.len() + value.len();
            if projected > quota {
                return Err(BackendError::QuotaExceeded);
            }
        }
        state.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let mut state = self.lock();
        if !state.available {
            return Err(unavailable());
        }
        state.entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// File store
// ============================================================================

/// Directory-backed store, one `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| map_io_error(e, &dir))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

/// Percent-encode every byte outside `[A-Za-z0-9._-]` so distinct keys map to distinct files
fn encode_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-' | b'_') {
            name.push(char::from(byte));
        } else {
            name.push_str(&format!("%{:02X}", byte));
        }
    }
    name
}

// ENOSPC and EDQUOT
const DISK_FULL_CODES: [i32; 2] = [28, 122];

fn map_io_error(err: io::Error, path: &Path) -> BackendError {
    if err
        .raw_os_error()
        .is_some_and(|code| DISK_FULL_CODES.contains(&code))
    {
        return BackendError::QuotaExceeded;
    }
    match err.kind() {
        io::ErrorKind::PermissionDenied => {
            BackendError::PermissionDenied(format!("{}: {}", path.display(), err))
        }
        io::ErrorKind::NotFound => {
            BackendError::Unavailable(format!("{}: {}", path.display(), err))
        }
        _ => BackendError::Other(format!("{}: {}", path.display(), err)),
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            // Non-UTF-8 bytes are surfaced as content so the caller can classify them as corrupt
            Err(e) if e.kind() == io::ErrorKind::InvalidData => std::fs::read(&path)
                .map(|bytes| Some(String::from_utf8_lossy(&bytes).into_owned()))
                .map_err(|e| map_io_error(e, &path)),
            Err(e) => Err(map_io_error(e, &path)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| map_io_error(e, &tmp))?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            map_io_error(e, &path)
        })
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io_error(e, &path)),
        }
    }
}
