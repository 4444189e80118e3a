//! Common traits for stash.
//!
//! `CacheStore` is the seam between the Orchestration API and whichever
//! component owns the key/value table (the actor, or a mutex-guarded table).

use async_trait::async_trait;

use crate::error::Result;
use crate::key::Key;
use crate::lifetime::Lifetime;

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// The three serialized primitives of a cache owner.
///
/// Implementations must apply operations one at a time, in the order they
/// are admitted. None of them fail under normal conditions; the only error
/// is [`StashError::Unavailable`](crate::StashError::Unavailable) when the
/// owner has stopped.
#[async_trait]
pub trait CacheStore<V>: Send + Sync
where
    V: Clone + Send + 'static,
{
    /// Returns the value for `key` if it is present and fresh.
    ///
    /// A hit with a finite lifetime restarts the entry's freshness window.
    /// A stale entry yields `None` and is left in place.
    async fn get(&self, key: &Key, lifetime: Lifetime) -> Result<Option<V>>;

    /// Creates or replaces the entry for `key`.
    ///
    /// May return before the write is applied, but any later-admitted
    /// operation observes it.
    async fn put(&self, key: Key, value: V) -> Result<()>;

    /// Removes any entry for `key`. Succeeds whether or not it was present.
    async fn delete(&self, key: &Key) -> Result<()>;
}
