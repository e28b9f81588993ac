//! FOLIO Storage - Derived-Value Cache
//!
//! Memoizes values derived from a content store and drops them when the
//! store is written. Includes in-memory and LMDB cache backends, the
//! categorized-site check built on top of them, and an in-memory content
//! store that emits write events.

pub mod cache;
pub mod categorized;
pub mod content_store;
pub mod telemetry;

// Re-export cache types for host integration
pub use cache::{
    CacheBackend, CacheEntry, CacheKey, CacheRead, CacheStats, CacheableValue, DerivedCacheStats,
    DerivedValueCache, Derivation, InMemoryCacheBackend, LmdbCacheBackend, LmdbCacheError, Lookup,
    WatchSet, WriteListener,
};
pub use categorized::{CategorizedSite, PublishedCategoryProbe, DEFAULT_PROBE_LIMIT};
pub use content_store::{InMemoryContentStore, PrimaryStore};
pub use telemetry::{init_tracing, TelemetryError};
