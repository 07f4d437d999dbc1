//! Ephemeral handles for local content.
//!
//! When the scene loader needs binary content that only exists in memory
//! (an uploaded mesh), the index mints a `blob:` handle for it. Handles are
//! owned by one [`HandleRegistry`] per index and released together.
//!
//! ```text
//! VirtualFileIndex
//! └── HandleRegistry (scope = unique per index)
//!     ├── by_key:  "pkg/meshes/arm.stl" → "blob:7-1/arm.stl"
//!     └── blobs:   "blob:7-1/arm.stl"   → bytes
//!
//! release_all() ── clears both maps, marks the registry released
//! Drop          ── release_all() if not released yet
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::path::{file_name, HANDLE_SCHEME};

/// Global scope counter so handles from different indices never collide.
static SCOPE: AtomicU64 = AtomicU64::new(1);

#[derive(Default)]
struct HandleTable {
    by_key: FxHashMap<String, String>,
    blobs: FxHashMap<String, Arc<[u8]>>,
    minted: u64,
    released: bool,
}

/// Owning collection of ephemeral handles for one index.
pub struct HandleRegistry {
    scope: u64,
    table: Mutex<HandleTable>,
}

impl HandleRegistry {
    /// Create an empty registry with a fresh scope.
    pub fn new() -> Self {
        Self {
            scope: SCOPE.fetch_add(1, Ordering::Relaxed),
            table: Mutex::new(HandleTable::default()),
        }
    }

    /// Return the handle for `key`, minting one on first use.
    ///
    /// The handle keeps the key's file name so loaders can still pick a
    /// decoder by extension. Returns `None` once the registry is released.
    pub fn mint(&self, key: &str, bytes: &Arc<[u8]>) -> Option<String> {
        let mut table = self.table.lock();
        if table.released {
            log::warn!("refusing to mint a handle for {key}: index already released");
            return None;
        }
        if let Some(handle) = table.by_key.get(key) {
            return Some(handle.clone());
        }
        table.minted += 1;
        let handle = format!("{HANDLE_SCHEME}{}-{}/{}", self.scope, table.minted, file_name(key));
        table.by_key.insert(key.to_string(), handle.clone());
        table.blobs.insert(handle.clone(), Arc::clone(bytes));
        log::debug!("minted {handle} for {key}");
        Some(handle)
    }

    /// Bytes behind a live handle.
    pub fn read(&self, handle: &str) -> Option<Arc<[u8]>> {
        self.table.lock().blobs.get(handle).cloned()
    }

    /// Number of live handles.
    pub fn live(&self) -> usize {
        self.table.lock().blobs.len()
    }

    /// Whether [`release_all`](Self::release_all) already ran.
    pub fn is_released(&self) -> bool {
        self.table.lock().released
    }

    /// Release every handle. Runs at most once; later calls return 0.
    pub fn release_all(&self) -> usize {
        let mut table = self.table.lock();
        if table.released {
            return 0;
        }
        table.released = true;
        table.by_key.clear();
        let count = table.blobs.len();
        table.blobs.clear();
        log::debug!("released {count} handle(s) in scope {}", self.scope);
        count
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for HandleRegistry {
    fn drop(&mut self) {
        self.release_all();
    }
}
