//! Snapshot store implementations
//!
//! Provides the `SnapshotStore` trait plus a filesystem-backed store keeping
//! JSON files in an XDG-compliant cache directory and an in-memory store
//! backed by a mutex-guarded map.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::data::Coupon;

/// Persisted snapshot of the last successfully validated coupon list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// The validated coupons
    pub coupons: Vec<Coupon>,
    /// When the snapshot was written
    pub cached_at: DateTime<Utc>,
}

impl CacheSnapshot {
    /// Creates a snapshot stamped with the current time
    pub fn new(coupons: Vec<Coupon>) -> Self {
        Self {
            coupons,
            cached_at: Utc::now(),
        }
    }

    /// Returns true once the snapshot is older than `timeout`
    ///
    /// Expired snapshots are still served on the fallback path; freshness
    /// only controls whether the remote source is contacted at all.
    pub fn is_expired(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        now - self.cached_at > timeout
    }
}

/// Key-value storage abstraction for cache snapshots
///
/// Modeled on a browser-style storage surface (get/set/remove on string
/// keys). Injected into `CouponCache` at construction so tests can swap in
/// an in-memory fake, and so two cache instances sharing one store can read
/// each other's snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Reads the raw value stored under `key`, if any
    fn get(&self, key: &str) -> Option<String>;

    /// Writes `value` under `key`, overwriting any existing entry
    fn set(&self, key: &str, value: &str) -> std::io::Result<()>;

    /// Deletes the entry under `key`; removing a missing key is not an error
    fn remove(&self, key: &str);
}

// Two cache instances can share one store behind an Arc and read each
// other's snapshots.
impl<P: SnapshotStore> SnapshotStore for std::sync::Arc<P> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

/// Filesystem-backed snapshot store
///
/// Stores each key as a `<key>.json` file in an XDG-compliant cache
/// directory (`~/.cache/couponcache/` on Linux). Unreadable or missing files
/// read as absent rather than failing.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl FileStore {
    /// Creates a new FileStore using the platform cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no
    /// home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "couponcache")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new FileStore rooted at a custom directory
    ///
    /// Useful for testing or when a specific cache location is needed.
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Returns the path of the file backing the given key
    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }
}

impl SnapshotStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;
        fs::write(self.entry_path(key), value)
    }

    fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.entry_path(key));
    }
}

/// In-memory snapshot store
///
/// Keeps entries in a mutex-guarded map. Used as the swappable fake in tests
/// and as the storage of last resort when no cache directory is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}
