//! "Does this site use more than one category?"
//!
//! Category lists in post meta are only worth printing when the site files
//! posts under several categories. The answer comes from a bounded probe of
//! the content store, memoized in a [`DerivedValueCache`] and dropped on
//! category edits and non-autosave record saves.
//!
//! Preview rendering always answers yes. That override is applied after the
//! cached read and is never stored.

use std::sync::Arc;

use folio_core::{CacheSettings, FolioResult, RenderMode, WriteEvent};

use crate::cache::{CacheBackend, CacheRead, DerivedValueCache, Derivation, WriteListener};
use crate::content_store::PrimaryStore;

/// Default number of category ids to ask the store for.
pub const DEFAULT_PROBE_LIMIT: usize = 2;

/// Counts categories attached to published posts, stopping at `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishedCategoryProbe {
    limit: usize,
}

impl PublishedCategoryProbe {
    /// Limits below [`DEFAULT_PROBE_LIMIT`] are raised to it.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(DEFAULT_PROBE_LIMIT),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for PublishedCategoryProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_LIMIT)
    }
}

impl Derivation for PublishedCategoryProbe {
    type Store<'s> = dyn PrimaryStore + 's;
    type Output = usize;

    fn derive(&self, store: &Self::Store<'_>) -> usize {
        store.find_category_ids(self.limit).len().min(self.limit)
    }
}

/// Memoized categorized-site check.
pub struct CategorizedSite<B: CacheBackend> {
    cache: DerivedValueCache<B, PublishedCategoryProbe>,
}

impl<B: CacheBackend> CategorizedSite<B> {
    /// Build from the `[cache]` settings: key, probe limit and TTL.
    pub fn new(backend: Arc<B>, settings: &CacheSettings) -> FolioResult<Self> {
        let probe = PublishedCategoryProbe::new(settings.probe_limit);
        Ok(Self {
            cache: DerivedValueCache::from_settings(backend, settings, probe)?,
        })
    }

    pub fn from_cache(cache: DerivedValueCache<B, PublishedCategoryProbe>) -> Self {
        Self { cache }
    }

    /// True when more than one category is attached to published posts,
    /// or when rendering a preview.
    pub fn is_categorized(&self, store: &dyn PrimaryStore, mode: RenderMode) -> bool {
        let count = self.category_count(store).into_value();
        count > 1 || mode.is_preview()
    }

    /// The bounded category count, memoized.
    pub fn category_count(&self, store: &dyn PrimaryStore) -> CacheRead<usize> {
        self.cache.read(store)
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    pub fn cache(&self) -> &DerivedValueCache<B, PublishedCategoryProbe> {
        &self.cache
    }
}

impl<B: CacheBackend> WriteListener for CategorizedSite<B> {
    fn on_write(&self, event: &WriteEvent) {
        self.cache.on_upstream_write(event);
    }
}
