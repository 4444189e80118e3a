//! Mutex-guarded cache for synchronous callers.
//!
//! Same table and freshness rules as the actor, but serialized by a
//! `parking_lot` mutex instead of a mailbox. Every operation is applied
//! before it returns, and the compute closure never runs under the lock.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use stash_core::{CacheStore, Key, Lifetime, Result};

use crate::stats::CacheStats;
use crate::table::CacheTable;

/// In-memory cache guarded by a mutex.
///
/// Thread-safe; share it behind an `Arc`.
#[derive(Debug)]
pub struct LockedCache<V> {
    table: Mutex<CacheTable<V>>,
}

impl<V: Clone> LockedCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty cache with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: Mutex::new(CacheTable::with_capacity(capacity)),
        }
    }

    /// Returns the value for `key` if it is present and fresh.
    pub fn lookup(&self, key: &Key, lifetime: Lifetime) -> Option<V> {
        self.table.lock().get(key, lifetime, Instant::now())
    }

    /// Creates or replaces the entry for `key`.
    pub fn insert(&self, key: Key, value: V) {
        self.table.lock().put(key, value, Instant::now());
    }

    /// Removes the entry for `key`, if any.
    pub fn remove(&self, key: &Key) {
        self.table.lock().delete(key);
    }

    /// Returns the cached value, or computes and caches it.
    pub fn get_or_compute<F>(&self, key: &Key, compute: F, lifetime: Lifetime) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.lookup(key, lifetime) {
            return value;
        }

        debug!(key = %key, "miss, computing");
        let value = compute();
        self.insert(key.clone(), value.clone());
        value
    }

    /// Removes `key` if `result` is `Ok`, then returns `result` unchanged.
    pub fn invalidate_after_write<T, E>(
        &self,
        result: std::result::Result<T, E>,
        key: &Key,
    ) -> std::result::Result<T, E> {
        if result.is_ok() {
            self.remove(key);
        }
        result
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.table.lock().clear();
    }

    /// Number of entries held, stale ones included.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        self.table.lock().stats()
    }
}

impl<V: Clone> Default for LockedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V> CacheStore<V> for LockedCache<V>
where
    V: Clone + Send + 'static,
{
    async fn get(&self, key: &Key, lifetime: Lifetime) -> Result<Option<V>> {
        Ok(self.lookup(key, lifetime))
    }

    async fn put(&self, key: Key, value: V) -> Result<()> {
        self.insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.remove(key);
        Ok(())
    }
}
