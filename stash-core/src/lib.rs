//! # Stash Core
//!
//! Core types, errors, and traits for the stash process-local query cache.
//!
//! This crate provides the building blocks shared by the cache and its callers:
//!
//! - **Key**: Validated symbolic identifiers that name cached values
//! - **Lifetime**: Sliding freshness windows, or "never expires"
//! - **Errors**: The `StashError` hierarchy
//! - **Traits**: `CacheStore`, the three cache primitives
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use stash_core::{Key, Lifetime};
//!
//! let key = Key::from_static("posts");
//! let lifetime = Lifetime::from_secs(5);
//!
//! assert_eq!(key.as_str(), "posts");
//! assert!(lifetime.is_fresh(Duration::from_secs(4)));
//! assert!(!lifetime.is_fresh(Duration::from_secs(5)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod error;
pub mod key;
pub mod lifetime;
pub mod traits;

// Re-export commonly used items at crate root
pub use error::{Result, StashError};
pub use key::{Key, MAX_KEY_LEN};
pub use lifetime::Lifetime;
pub use traits::CacheStore;
