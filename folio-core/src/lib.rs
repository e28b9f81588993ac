//! FOLIO Core - Content Records, Write Events and Configuration
//!
//! Pure data structures shared by the cache layer. This crate contains the
//! content records a derivation reads, the write events that invalidate
//! derived values, the render mode, error types and configuration.
//! No caching logic lives here.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod config;
pub mod content;
pub mod error;
pub mod event;

pub use config::{
    check_cache_key, check_cache_namespace, BackendConfig, BackendKind, CacheSettings, FolioConfig,
    LoggingConfig, CACHE_KEY_SEPARATOR, MAX_CACHE_KEY_LEN,
};
pub use content::{Category, Post, PostStatus, RenderMode};
pub use error::{ConfigError, FolioError, FolioResult, StorageError, ValidationError};
pub use event::{SaveKind, WriteEvent, WriteEventKind};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_id_is_v7() {
        let id = new_entity_id();
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn test_new_entity_ids_are_sortable() {
        let first = new_entity_id();
        let second = new_entity_id();
        assert!(first < second);
    }
}
