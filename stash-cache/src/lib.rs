//! # Stash Cache
//!
//! Process-local cache for small, slow-changing query results.
//!
//! A single actor owns the key/value table and applies reads, writes and
//! deletes strictly in order. Freshness is a sliding window chosen per read:
//! every hit restarts the entry's lifetime, and expired entries are treated as
//! absent without being swept.
//!
//! - **Actor**: [`CacheActor`] owns the table; [`CacheHandle`] reaches it
//! - **Locked**: [`LockedCache`], the same table behind a mutex for sync code
//! - **Orchestration**: compute on miss, invalidate after a successful write
//!
//! There is no single-flight: concurrent misses on one key all compute.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stash_cache::{CacheConfig, CacheHandle};
//! use stash_core::{Key, Lifetime};
//!
//! # async fn example() -> stash_core::Result<()> {
//! let cache: CacheHandle<Vec<String>> = CacheHandle::spawn(CacheConfig::default())?;
//! let posts = Key::from_static("posts");
//!
//! let rows = cache
//!     .get_or_compute(&posts, || vec!["A".into(), "B".into()], Lifetime::from_secs(5))
//!     .await?;
//!
//! // After a write to the posts table:
//! let saved: Result<u64, String> = Ok(1);
//! let saved = cache.invalidate_after_write(saved, &posts).await;
//! # let _ = (rows, saved);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod actor;
mod config;
mod locked;
pub mod orchestration;
mod stats;
mod table;

pub use actor::{CacheActor, CacheHandle};
pub use config::CacheConfig;
pub use locked::LockedCache;
pub use orchestration::{
    get_or_compute, get_or_compute_async, invalidate_after_write, try_get_or_compute,
};
pub use stats::CacheStats;
pub use table::{CacheEntry, CacheTable, Lookup};

// Re-export the core vocabulary so callers need one import
pub use stash_core::{CacheStore, Key, Lifetime, Result, StashError};
