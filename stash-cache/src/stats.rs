//! Cache statistics.

use serde::{Deserialize, Serialize};

/// Snapshot of a cache's counters.
///
/// Counters are cumulative since the cache was created; `clear` drops
/// entries but keeps the counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries physically held, including stale ones not yet overwritten
    pub entries: usize,
    /// Lookups served from a fresh entry
    pub hits: u64,
    /// Lookups that found no fresh entry
    pub misses: u64,
    /// Misses caused by an expired entry (subset of `misses`)
    pub stale_misses: u64,
    /// Entries created or replaced
    pub puts: u64,
    /// Delete requests, whether or not the key was present
    pub deletes: u64,
}

impl CacheStats {
    /// Total lookups.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that were hits, or 0.0 before any lookup.
    pub fn hit_ratio(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            n => self.hits as f64 / n as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_ratio() {
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);

        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.lookups(), 4);
        assert!((stats.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serializes_to_json() {
        let stats = CacheStats {
            entries: 2,
            hits: 5,
            ..Default::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["entries"], 2);
        assert_eq!(json["hits"], 5);
        assert_eq!(json["stale_misses"], 0);
    }
}
