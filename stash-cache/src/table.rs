//! The key/value table and its freshness rules.
//!
//! `CacheTable` is a plain single-owner state machine. It never reads the
//! clock itself: every operation takes `now`, so whoever owns the table (the
//! actor loop or a mutex) decides what time it is.

use std::collections::HashMap;

use tokio::time::Instant;

use stash_core::{Key, Lifetime};

use crate::stats::CacheStats;

/// Cached value plus the instant its freshness window started.
#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    value: V,
    last_accessed: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, now: Instant) -> Self {
        Self {
            value,
            last_accessed: now,
        }
    }

    /// The cached value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// When the entry was stored or last refreshed by a hit.
    pub fn last_accessed(&self) -> Instant {
        self.last_accessed
    }

    fn is_fresh(&self, lifetime: Lifetime, now: Instant) -> bool {
        lifetime.is_fresh(now.saturating_duration_since(self.last_accessed))
    }

    fn touch(&mut self, now: Instant) {
        // Never move the window backwards.
        if now > self.last_accessed {
            self.last_accessed = now;
        }
    }
}

/// Outcome of a single lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup<V> {
    /// A fresh entry was found.
    Hit(V),
    /// No entry exists for the key.
    Absent,
    /// An entry exists but has outlived the lifetime. It stays in the table.
    Stale,
}

impl<V> Lookup<V> {
    /// Collapses misses of either kind into `None`.
    pub fn into_option(self) -> Option<V> {
        match self {
            Lookup::Hit(v) => Some(v),
            Lookup::Absent | Lookup::Stale => None,
        }
    }

    /// Returns true for `Hit`.
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }
}

/// Mapping from key to exactly one entry.
#[derive(Debug)]
pub struct CacheTable<V> {
    entries: HashMap<Key, CacheEntry<V>>,
    stats: CacheStats,
}

impl<V: Clone> CacheTable<V> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty table with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Looks up `key` and classifies the result.
    ///
    /// A fresh hit under a finite lifetime restarts the freshness window at
    /// `now`. Infinite lifetimes leave the timestamp alone. Stale entries are
    /// reported but not removed.
    pub fn lookup(&mut self, key: &Key, lifetime: Lifetime, now: Instant) -> Lookup<V> {
        let outcome = match self.entries.get_mut(key) {
            None => Lookup::Absent,
            Some(entry) if entry.is_fresh(lifetime, now) => {
                if !lifetime.is_infinite() {
                    entry.touch(now);
                }
                Lookup::Hit(entry.value.clone())
            }
            Some(_) => Lookup::Stale,
        };

        match outcome {
            Lookup::Hit(_) => self.stats.hits += 1,
            Lookup::Absent => self.stats.misses += 1,
            Lookup::Stale => {
                self.stats.misses += 1;
                self.stats.stale_misses += 1;
            }
        }
        outcome
    }

    /// Returns the value for `key` if it is present and fresh.
    pub fn get(&mut self, key: &Key, lifetime: Lifetime, now: Instant) -> Option<V> {
        self.lookup(key, lifetime, now).into_option()
    }

    /// Creates or fully replaces the entry for `key`, stamped at `now`.
    pub fn put(&mut self, key: Key, value: V, now: Instant) {
        self.entries.insert(key, CacheEntry::new(value, now));
        self.stats.puts += 1;
    }

    /// Removes the entry for `key`. Returns whether one was present.
    pub fn delete(&mut self, key: &Key) -> bool {
        self.stats.deletes += 1;
        self.entries.remove(key).is_some()
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Borrows the raw entry for `key` without any freshness check.
    pub fn entry(&self, key: &Key) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Number of entries physically held, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ..self.stats.clone()
        }
    }
}

impl<V: Clone> Default for CacheTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn posts() -> Key {
        Key::from_static("posts")
    }

    #[test]
    fn test_absent_key_misses() {
        let mut table: CacheTable<u32> = CacheTable::new();
        let now = Instant::now();
        assert_eq!(table.lookup(&posts(), Lifetime::Infinite, now), Lookup::Absent);
        assert_eq!(table.stats().misses, 1);
        assert_eq!(table.stats().stale_misses, 0);
    }

    #[test]
    fn test_infinite_lifetime_never_refreshes() {
        let mut table = CacheTable::new();
        let t0 = Instant::now();
        table.put(posts(), 7, t0);

        assert_eq!(table.get(&posts(), Lifetime::Infinite, t0 + secs(3600)), Some(7));
        assert_eq!(table.entry(&posts()).unwrap().last_accessed(), t0);
    }

    #[test]
    fn test_finite_hit_refreshes_timestamp() {
        let mut table = CacheTable::new();
        let t0 = Instant::now();
        table.put(posts(), 7, t0);

        assert_eq!(table.get(&posts(), Lifetime::from_secs(5), t0 + secs(3)), Some(7));
        assert_eq!(table.entry(&posts()).unwrap().last_accessed(), t0 + secs(3));
    }

    #[test]
    fn test_stale_entry_is_kept() {
        let mut table = CacheTable::new();
        let t0 = Instant::now();
        table.put(posts(), 7, t0);

        let lookup = table.lookup(&posts(), Lifetime::from_secs(5), t0 + secs(5));
        assert_eq!(lookup, Lookup::Stale);
        assert_eq!(table.len(), 1);
        assert_eq!(table.entry(&posts()).unwrap().last_accessed(), t0);

        let stats = table.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.stale_misses, 1);
    }

    #[test]
    fn test_stale_under_one_lifetime_fresh_under_another() {
        let mut table = CacheTable::new();
        let t0 = Instant::now();
        table.put(posts(), 7, t0);

        assert!(table.get(&posts(), Lifetime::from_secs(1), t0 + secs(2)).is_none());
        assert_eq!(table.get(&posts(), Lifetime::from_secs(10), t0 + secs(2)), Some(7));
    }

    #[test]
    fn test_zero_lifetime_is_always_stale() {
        let mut table = CacheTable::new();
        let t0 = Instant::now();
        table.put(posts(), 7, t0);
        assert_eq!(table.lookup(&posts(), Lifetime::from_secs(0), t0), Lookup::Stale);
    }

    #[test]
    fn test_put_replaces_entry() {
        let mut table = CacheTable::new();
        let t0 = Instant::now();
        table.put(posts(), vec!["A"], t0);
        table.put(posts(), vec!["B"], t0 + secs(1));

        assert_eq!(table.len(), 1);
        let entry = table.entry(&posts()).unwrap();
        assert_eq!(entry.value(), &vec!["B"]);
        assert_eq!(entry.last_accessed(), t0 + secs(1));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut table = CacheTable::new();
        let t0 = Instant::now();
        table.put(posts(), 1, t0);

        assert!(table.delete(&posts()));
        assert!(!table.delete(&posts()));
        assert!(table.is_empty());
        assert_eq!(table.stats().deletes, 2);
    }

    #[test]
    fn test_clear_keeps_counters() {
        let mut table = CacheTable::new();
        let t0 = Instant::now();
        table.put(posts(), 1, t0);
        table.put(Key::from_static("users"), 2, t0);
        table.get(&posts(), Lifetime::Infinite, t0);

        table.clear();

        let stats = table.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.puts, 2);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_sliding_scenario() {
        // Stored at t=0 with a 5s lifetime, read at 3, 7 and 9.
        let mut table = CacheTable::new();
        let lifetime = Lifetime::from_secs(5);
        let t0 = Instant::now();
        table.put(posts(), vec!["A", "B"], t0);

        assert_eq!(table.get(&posts(), lifetime, t0 + secs(3)), Some(vec!["A", "B"]));
        assert_eq!(table.get(&posts(), lifetime, t0 + secs(7)), Some(vec!["A", "B"]));
        assert_eq!(table.get(&posts(), lifetime, t0 + secs(13)), None);
    }

    proptest! {
        #[test]
        fn last_accessed_never_decreases(offsets in prop::collection::vec(0u64..10_000, 1..50)) {
            let mut table = CacheTable::new();
            let t0 = Instant::now();
            table.put(posts(), 0u8, t0);

            let mut previous = t0;
            for ms in offsets {
                let now = t0 + Duration::from_millis(ms);
                table.get(&posts(), Lifetime::from_secs(60), now);
                let current = table.entry(&posts()).unwrap().last_accessed();
                prop_assert!(current >= previous);
                previous = current;
            }
        }
    }
}
