//! In-memory key-value store.
//!
//! Lets tests drive the settings logic without touching the disk, and inject
//! the failures a real backend can produce: the whole store going away, or a
//! single key holding a value that cannot be read back.

use std::collections::{HashMap, HashSet};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex, MutexGuard, PoisonError,
};

use async_trait::async_trait;

use crate::application::settings_store::{KeyValueStore, StoreError};

/// A [`KeyValueStore`] backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    corrupt: Mutex<HashSet<String>>,
    reads_unavailable: AtomicBool,
    writes_unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value directly, bypassing the write counter and fault flags.
    pub fn insert(&self, key: &str, value: &str) {
        lock(&self.values).insert(key.to_string(), value.to_string());
    }

    /// Returns the raw stored value, ignoring fault flags.
    pub fn value(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    /// Makes every subsequent `get` of `key` fail with
    /// [`StoreError::CorruptValue`] until the key is written again.
    pub fn mark_corrupt(&self, key: &str) {
        lock(&self.corrupt).insert(key.to_string());
    }

    /// When `true`, every `get` fails with [`StoreError::Unavailable`].
    pub fn set_reads_unavailable(&self, unavailable: bool) {
        self.reads_unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// When `true`, every `set` fails with [`StoreError::Unavailable`].
    pub fn set_writes_unavailable(&self, unavailable: bool) {
        self.writes_unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.reads_unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        if lock(&self.corrupt).contains(key) {
            return Err(StoreError::CorruptValue {
                key: key.to_string(),
                reason: "injected corruption".to_string(),
            });
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.writes_unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store read-only".to_string()));
        }
        lock(&self.corrupt).remove(key);
        self.insert(key, value);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
