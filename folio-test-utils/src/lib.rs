//! FOLIO Test Utilities
//!
//! Shared test infrastructure for the FOLIO workspace:
//! - Proptest generators for content records and write events
//! - Fixtures for seeded content stores and wired-up caches

use std::sync::Arc;

pub use folio_core::{
    new_entity_id, CacheSettings, Category, EntityId, FolioConfig, Post, PostStatus, RenderMode,
    SaveKind, WriteEvent, WriteEventKind,
};
pub use folio_storage::{
    CategorizedSite, InMemoryCacheBackend, InMemoryContentStore, LmdbCacheBackend, PrimaryStore,
};

use chrono::Utc;
use proptest::prelude::*;
use tempfile::TempDir;

// ============================================================================
// GENERATORS
// ============================================================================

/// Any post status.
pub fn post_status_strategy() -> impl Strategy<Value = PostStatus> {
    prop_oneof![
        Just(PostStatus::Publish),
        Just(PostStatus::Future),
        Just(PostStatus::Draft),
        Just(PostStatus::Pending),
        Just(PostStatus::Private),
        Just(PostStatus::AutoDraft),
        Just(PostStatus::Trash),
    ]
}

/// Statuses that do not count as published.
pub fn unpublished_status_strategy() -> impl Strategy<Value = PostStatus> {
    post_status_strategy().prop_filter("unpublished", |s| !s.is_published())
}

pub fn save_kind_strategy() -> impl Strategy<Value = SaveKind> {
    prop_oneof![Just(SaveKind::Manual), Just(SaveKind::Autosave)]
}

pub fn render_mode_strategy() -> impl Strategy<Value = RenderMode> {
    prop_oneof![Just(RenderMode::Published), Just(RenderMode::Preview)]
}

/// Any write event: a category edit, or a record save of either kind.
pub fn write_event_strategy() -> impl Strategy<Value = WriteEvent> {
    prop_oneof![
        Just(()).prop_map(|_| WriteEvent::category_edit(new_entity_id())),
        save_kind_strategy().prop_map(|save| WriteEvent::record_save(new_entity_id(), save)),
    ]
}

/// Human-looking category names.
pub fn category_name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,12}( [A-Z][a-z]{2,10})?"
}

// ============================================================================
// FIXTURES
// ============================================================================

/// A store with `published` categories each carrying one published post,
/// plus `unattached` categories with no posts.
pub fn seeded_store(published: usize, unattached: usize) -> (InMemoryContentStore, Vec<Category>) {
    let store = InMemoryContentStore::new();
    let mut categories = Vec::with_capacity(published + unattached);

    for i in 0..published {
        let category = Category::new(format!("Published {}", i));
        store
            .insert_category(category.clone())
            .expect("seed category");
        store
            .save_post(
                make_post(PostStatus::Publish, &[category.category_id]),
                SaveKind::Manual,
            )
            .expect("seed post");
        categories.push(category);
    }
    for i in 0..unattached {
        let category = Category::new(format!("Empty {}", i));
        store
            .insert_category(category.clone())
            .expect("seed category");
        categories.push(category);
    }

    (store, categories)
}

pub fn make_post(status: PostStatus, category_ids: &[EntityId]) -> Post {
    let mut post = Post::new(format!("Post at {}", Utc::now().timestamp_micros()), status);
    for id in category_ids {
        post = post.with_category(*id);
    }
    post
}

/// Categorized-site check over a fresh in-memory backend.
pub fn memory_site() -> (Arc<CategorizedSite<InMemoryCacheBackend>>, Arc<InMemoryCacheBackend>) {
    let backend = Arc::new(InMemoryCacheBackend::new());
    let site = CategorizedSite::new(backend.clone(), &CacheSettings::default())
        .expect("default settings are valid");
    (Arc::new(site), backend)
}

/// Categorized-site check subscribed to `store`'s write events.
pub fn wired_memory_site(
    store: &InMemoryContentStore,
) -> (Arc<CategorizedSite<InMemoryCacheBackend>>, Arc<InMemoryCacheBackend>) {
    let (site, backend) = memory_site();
    store.subscribe(site.clone()).expect("subscribe");
    (site, backend)
}

/// LMDB backend in a temporary directory. Keep the `TempDir` alive.
pub fn temp_lmdb_backend() -> (Arc<LmdbCacheBackend>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let backend = LmdbCacheBackend::new(temp_dir.path(), 10).expect("Failed to create backend");
    (Arc::new(backend), temp_dir)
}
