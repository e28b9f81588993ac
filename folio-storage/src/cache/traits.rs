//! Cache backend trait and cacheable value marker.
//!
//! This module defines the contract a key/value store must meet to hold
//! derived values.

use folio_core::FolioResult;
use serde::{de::DeserializeOwned, Serialize};

use super::entry::{CacheEntry, Lookup};
use super::key::CacheKey;

/// Marker trait for values that can be stored by a backend.
///
/// Blanket-implemented for every `Clone + Serialize + DeserializeOwned`
/// type that is `Send + Sync + 'static`.
pub trait CacheableValue: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheableValue for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Key/value storage for derived values.
///
/// Backends store entries verbatim and never expire them on their own;
/// expiry (when configured) is decided by the cache reading the entry.
/// Implementations must be safe to share across threads.
pub trait CacheBackend: Send + Sync {
    /// Get the entry stored under `key`.
    ///
    /// `Lookup::Absent` is the normal "nothing stored" answer, not an error.
    fn get<T: CacheableValue>(&self, key: &CacheKey) -> FolioResult<Lookup<CacheEntry<T>>>;

    /// Store `entry` under `key`, replacing any previous entry.
    fn set<T: CacheableValue>(&self, key: &CacheKey, entry: &CacheEntry<T>) -> FolioResult<()>;

    /// Delete the entry under `key`. Returns whether an entry existed.
    fn delete(&self, key: &CacheKey) -> FolioResult<bool>;

    /// Get cache statistics.
    fn stats(&self) -> FolioResult<CacheStats>;
}

impl<B: CacheBackend> CacheBackend for std::sync::Arc<B> {
    fn get<T: CacheableValue>(&self, key: &CacheKey) -> FolioResult<Lookup<CacheEntry<T>>> {
        (**self).get(key)
    }

    fn set<T: CacheableValue>(&self, key: &CacheKey, entry: &CacheEntry<T>) -> FolioResult<()> {
        (**self).set(key, entry)
    }

    fn delete(&self, key: &CacheKey) -> FolioResult<bool> {
        (**self).delete(key)
    }

    fn stats(&self) -> FolioResult<CacheStats> {
        (**self).stats()
    }
}

/// Statistics about backend usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of `get` calls that found an entry.
    pub hits: u64,
    /// Number of `get` calls that found nothing.
    pub misses: u64,
    /// Number of `set` calls.
    pub writes: u64,
    /// Number of `delete` calls that removed an entry.
    pub deletes: u64,
    /// Number of entries currently stored.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
