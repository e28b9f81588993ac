//! Derived-value cache with explicit invalidation.
//!
//! A derived value is computed from the content store, stored under one
//! fixed [`CacheKey`], and served unchanged until a watched write event
//! deletes it. Nothing is polled and, unless a TTL is configured, nothing
//! expires on its own.
//!
//! # Lookups
//!
//! Backends answer `get` with [`Lookup::Present`] or [`Lookup::Absent`], so a
//! stored `false` or `0` is never mistaken for "no entry".
//!
//! # Example
//!
//! ```ignore
//! let backend = Arc::new(InMemoryCacheBackend::new());
//! let cache = DerivedValueCache::new(backend, CacheKey::new("folio_categories")?, probe);
//!
//! store.subscribe(Arc::new(cache))?;   // writes now invalidate
//! ```

pub mod derived;
pub mod entry;
pub mod key;
pub mod lmdb_backend;
pub mod memory_backend;
pub mod traits;
pub mod watch;

pub use derived::{DerivedCacheStats, DerivedValueCache, Derivation};
pub use entry::{CacheEntry, CacheRead, Lookup};
pub use key::{CacheKey, MAX_KEY_LEN};
pub use lmdb_backend::{LmdbCacheBackend, LmdbCacheError};
pub use memory_backend::InMemoryCacheBackend;
pub use traits::{CacheBackend, CacheStats, CacheableValue};
pub use watch::{WatchSet, WriteListener};
