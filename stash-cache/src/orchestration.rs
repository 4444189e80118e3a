//! Compute-on-miss and invalidate-after-write, built from the three
//! [`CacheStore`] primitives.
//!
//! These functions hold no state. The computation always runs in the
//! caller's task, outside the store's serialization, so two callers that miss
//! on the same key both compute and both store; the later `put` wins.

use std::future::Future;

use tracing::{debug, instrument, trace, warn};

use stash_core::{CacheStore, Key, Lifetime, Result, StashError};

/// Returns the cached value for `key`, or computes, stores and returns it.
///
/// `compute` is only invoked on a miss. The value is returned without
/// waiting for the store to apply the write.
#[instrument(level = "debug", skip_all, fields(key = %key, lifetime = %lifetime))]
pub async fn get_or_compute<V, S, F>(
    store: &S,
    key: &Key,
    compute: F,
    lifetime: Lifetime,
) -> Result<V>
where
    V: Clone + Send + 'static,
    S: CacheStore<V> + ?Sized,
    F: FnOnce() -> V + Send,
{
    if let Some(value) = store.get(key, lifetime).await? {
        trace!("hit");
        return Ok(value);
    }

    debug!("miss, computing");
    let value = compute();
    store_computed(store, key, value.clone()).await;
    Ok(value)
}

/// Like [`get_or_compute`], for computations that are themselves async.
#[instrument(level = "debug", skip_all, fields(key = %key, lifetime = %lifetime))]
pub async fn get_or_compute_async<V, S, F, Fut>(
    store: &S,
    key: &Key,
    compute: F,
    lifetime: Lifetime,
) -> Result<V>
where
    V: Clone + Send + 'static,
    S: CacheStore<V> + ?Sized,
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = V> + Send,
{
    if let Some(value) = store.get(key, lifetime).await? {
        trace!("hit");
        return Ok(value);
    }

    debug!("miss, computing");
    let value = compute().await;
    store_computed(store, key, value.clone()).await;
    Ok(value)
}

/// Caches only successful computations.
///
/// An `Err` from `compute` is returned as-is and nothing is stored, so the
/// next call tries again. Cache failures convert into `E`.
#[instrument(level = "debug", skip_all, fields(key = %key, lifetime = %lifetime))]
pub async fn try_get_or_compute<V, S, F, Fut, E>(
    store: &S,
    key: &Key,
    compute: F,
    lifetime: Lifetime,
) -> std::result::Result<V, E>
where
    V: Clone + Send + 'static,
    S: CacheStore<V> + ?Sized,
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = std::result::Result<V, E>> + Send,
    E: From<StashError> + Send,
{
    if let Some(value) = store.get(key, lifetime).await? {
        trace!("hit");
        return Ok(value);
    }

    debug!("miss, computing");
    let value = compute().await?;
    store_computed(store, key, value.clone()).await;
    Ok(value)
}

/// Deletes `key` if `result` is `Ok`, then returns `result` unchanged.
///
/// An `Err` skips invalidation. This never fails: if the delete cannot be
/// delivered it is logged and the write result is still returned.
#[instrument(level = "debug", skip_all, fields(key = %key, ok = result.is_ok()))]
pub async fn invalidate_after_write<V, S, T, E>(
    store: &S,
    result: std::result::Result<T, E>,
    key: &Key,
) -> std::result::Result<T, E>
where
    V: Clone + Send + 'static,
    S: CacheStore<V> + ?Sized,
    T: Send,
    E: Send,
{
    if result.is_ok() {
        if let Err(err) = store.delete(key).await {
            warn!(error = %err, "invalidation after successful write was not delivered");
        }
    }
    result
}

async fn store_computed<V, S>(store: &S, key: &Key, value: V)
where
    V: Clone + Send + 'static,
    S: CacheStore<V> + ?Sized,
{
    if let Err(err) = store.put(key.clone(), value).await {
        warn!(error = %err, "computed value was not cached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::locked::LockedCache;

    #[derive(Debug, PartialEq)]
    enum QueryError {
        Db(&'static str),
        Cache,
    }

    impl From<StashError> for QueryError {
        fn from(_: StashError) -> Self {
            QueryError::Cache
        }
    }

    fn posts() -> Key {
        Key::from_static("posts")
    }

    #[tokio::test]
    async fn test_compute_runs_once() {
        let cache = LockedCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = get_or_compute(
                &cache,
                &posts(),
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    42
                },
                Lifetime::Infinite,
            )
            .await
            .unwrap();
            assert_eq!(value, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_async_compute() {
        let cache = LockedCache::new();
        let value = get_or_compute_async(&cache, &posts(), || async { "rows" }, Lifetime::Infinite)
            .await
            .unwrap();
        assert_eq!(value, "rows");
        assert_eq!(cache.lookup(&posts(), Lifetime::Infinite), Some("rows"));
    }

    #[tokio::test]
    async fn test_failed_compute_not_cached() {
        let cache: LockedCache<u32> = LockedCache::new();

        let err = try_get_or_compute(
            &cache,
            &posts(),
            || async { Err(QueryError::Db("timeout")) },
            Lifetime::Infinite,
        )
        .await
        .unwrap_err();
        assert_eq!(err, QueryError::Db("timeout"));
        assert!(cache.is_empty());

        let value: std::result::Result<u32, QueryError> =
            try_get_or_compute(&cache, &posts(), || async { Ok(7) }, Lifetime::Infinite).await;
        assert_eq!(value, Ok(7));
        assert_eq!(cache.lookup(&posts(), Lifetime::Infinite), Some(7));
    }

    #[tokio::test]
    async fn test_invalidate_on_ok() {
        let cache = LockedCache::new();
        cache.insert(posts(), 1);

        let result: std::result::Result<&str, &str> =
            invalidate_after_write(&cache, Ok("saved"), &posts()).await;
        assert_eq!(result, Ok("saved"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_error_passes_through() {
        let cache = LockedCache::new();
        cache.insert(posts(), 1);

        let result: std::result::Result<(), &str> =
            invalidate_after_write(&cache, Err("constraint violation"), &posts()).await;
        assert_eq!(result, Err("constraint violation"));
        assert_eq!(cache.lookup(&posts(), Lifetime::Infinite), Some(1));
    }
}
