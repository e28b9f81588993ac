//! Read-through cache for a single derived value.
//!
//! A [`DerivedValueCache`] memoizes the output of a [`Derivation`] under one
//! fixed key. The entry is created on the first read, served unchanged until
//! a watched write event (or an explicit `invalidate`) deletes it, and
//! recreated on the next read.
//!
//! Backend failures never reach the caller. A failed `get` falls back to
//! running the derivation, a failed `set` returns the value uncached, and a
//! failed `delete` is logged. The derivation must therefore stay cheap
//! enough to run on every request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use folio_core::{CacheSettings, FolioResult, WriteEvent};
use tracing::{debug, info, warn};

use super::entry::{CacheEntry, CacheRead, Lookup};
use super::key::CacheKey;
use super::traits::{CacheBackend, CacheableValue};
use super::watch::{WatchSet, WriteListener};

/// A pure, total function from store state to a value worth caching.
pub trait Derivation: Send + Sync {
    /// What the derivation reads. Generic over the borrow so trait-object
    /// stores need not be `'static`.
    type Store<'s>: ?Sized;
    /// What it produces.
    type Output: CacheableValue;

    fn derive(&self, store: &Self::Store<'_>) -> Self::Output;
}

/// Counters kept by a [`DerivedValueCache`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedCacheStats {
    /// Reads served from a stored entry.
    pub hits: u64,
    /// Times the derivation ran.
    pub derivations: u64,
    /// Calls to `invalidate`, including those triggered by write events.
    pub invalidations: u64,
    /// Backend calls that failed and were degraded around.
    pub backend_errors: u64,
}

#[derive(Debug, Default)]
struct StatsInner {
    hits: AtomicU64,
    derivations: AtomicU64,
    invalidations: AtomicU64,
    backend_errors: AtomicU64,
}

/// Memoized derived value with explicit invalidation.
///
/// # Example
///
/// ```ignore
/// let cache = DerivedValueCache::new(backend, CacheKey::new("folio_categories")?, probe);
/// let count = cache.read(&store).into_value();   // derives and stores
/// let again = cache.read(&store);                // served from the entry
/// cache.on_upstream_write(&WriteEvent::category_edit(id));
/// ```
pub struct DerivedValueCache<B, D>
where
    B: CacheBackend,
    D: Derivation,
{
    backend: Arc<B>,
    derivation: D,
    key: CacheKey,
    watch: WatchSet,
    entry_ttl: Option<Duration>,
    stats: StatsInner,
}

impl<B, D> DerivedValueCache<B, D>
where
    B: CacheBackend,
    D: Derivation,
{
    /// Create a cache that watches category edits and non-autosave record
    /// saves, with no entry expiry.
    pub fn new(backend: Arc<B>, key: CacheKey, derivation: D) -> Self {
        Self {
            backend,
            derivation,
            key,
            watch: WatchSet::default(),
            entry_ttl: None,
            stats: StatsInner::default(),
        }
    }

    /// Create a cache keyed and bounded by the `[cache]` settings.
    pub fn from_settings(
        backend: Arc<B>,
        settings: &CacheSettings,
        derivation: D,
    ) -> FolioResult<Self> {
        let key = CacheKey::from_settings(settings)?;
        Ok(Self::new(backend, key, derivation).with_ttl(settings.entry_ttl()))
    }

    pub fn with_watch(mut self, watch: WatchSet) -> Self {
        self.watch = watch;
        self
    }

    /// Bound entry lifetime. `None` keeps entries until invalidated.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.entry_ttl = ttl;
        self
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn watch(&self) -> &WatchSet {
        &self.watch
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn derivation(&self) -> &D {
        &self.derivation
    }

    /// Return the cached value, deriving and storing it on a miss.
    pub fn read(&self, store: &D::Store<'_>) -> CacheRead<D::Output> {
        match self.backend.get::<D::Output>(&self.key) {
            Ok(Lookup::Present(entry)) if entry.is_valid_at(Utc::now()) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %self.key, "Derived value cache hit");
                return CacheRead::from_cache(entry);
            }
            Ok(Lookup::Present(entry)) => {
                debug!(
                    key = %self.key,
                    valid_until = ?entry.valid_until,
                    "Derived value expired"
                );
                self.delete_entry();
            }
            Ok(Lookup::Absent) => {
                debug!(key = %self.key, "Derived value cache miss");
            }
            Err(e) => {
                self.stats.backend_errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %self.key, error = %e, "Cache get failed, deriving without cache");
            }
        }

        self.derive_and_store(store)
    }

    /// Discard the current entry, if any. Never fails.
    pub fn invalidate(&self) {
        self.stats.invalidations.fetch_add(1, Ordering::Relaxed);
        if self.delete_entry() {
            info!(key = %self.key, "Derived value invalidated");
        }
    }

    /// Invalidate when `event` is in the watch set. Returns whether it was.
    pub fn on_upstream_write(&self, event: &WriteEvent) -> bool {
        if !self.watch.matches(event) {
            debug!(
                key = %self.key,
                event_id = %event.event_id,
                kind = %event.kind,
                is_autosave = event.is_autosave,
                "Write event ignored"
            );
            return false;
        }

        debug!(
            key = %self.key,
            event_id = %event.event_id,
            kind = %event.kind,
            "Write event invalidates derived value"
        );
        self.invalidate();
        true
    }

    /// Look at the stored entry without deriving.
    pub fn peek(&self) -> FolioResult<Lookup<CacheEntry<D::Output>>> {
        self.backend.get::<D::Output>(&self.key)
    }

    pub fn stats(&self) -> DerivedCacheStats {
        DerivedCacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            derivations: self.stats.derivations.load(Ordering::Relaxed),
            invalidations: self.stats.invalidations.load(Ordering::Relaxed),
            backend_errors: self.stats.backend_errors.load(Ordering::Relaxed),
        }
    }

    fn derive_and_store(&self, store: &D::Store<'_>) -> CacheRead<D::Output> {
        let value = self.derivation.derive(store);
        self.stats.derivations.fetch_add(1, Ordering::Relaxed);

        let entry = CacheEntry::with_ttl(value, Utc::now(), self.entry_ttl);
        if let Err(e) = self.backend.set(&self.key, &entry) {
            self.stats.backend_errors.fetch_add(1, Ordering::Relaxed);
            warn!(key = %self.key, error = %e, "Cache set failed, value not cached");
        }

        CacheRead::derived(entry.value, entry.computed_at)
    }

    /// Returns whether an entry was deleted.
    fn delete_entry(&self) -> bool {
        match self.backend.delete(&self.key) {
            Ok(existed) => existed,
            Err(e) => {
                self.stats.backend_errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %self.key, error = %e, "Cache delete failed");
                false
            }
        }
    }
}

impl<B, D> WriteListener for DerivedValueCache<B, D>
where
    B: CacheBackend,
    D: Derivation,
{
    fn on_write(&self, event: &WriteEvent) {
        self.on_upstream_write(event);
    }
}
