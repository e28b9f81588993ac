//! Primary content store contract and in-memory implementation.
//!
//! The store is the source of truth a derivation reads. It is also a write
//! event source: every category edit and record save notifies the
//! registered listeners before the call returns.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use folio_core::{
    Category, EntityId, FolioResult, Post, SaveKind, StorageError, WriteEvent,
};
use tracing::debug;

use crate::cache::WriteListener;

/// Read access a derivation needs from the content store.
pub trait PrimaryStore: Send + Sync {
    /// Up to `limit` ids of categories attached to at least one published
    /// post, in ascending id order.
    ///
    /// Implementations should stop looking once `limit` ids are found.
    fn find_category_ids(&self, limit: usize) -> Vec<EntityId>;
}

/// In-memory content store.
#[derive(Default)]
pub struct InMemoryContentStore {
    categories: RwLock<BTreeMap<EntityId, Category>>,
    posts: RwLock<BTreeMap<EntityId, Post>>,
    listeners: RwLock<Vec<Arc<dyn WriteListener>>>,
    queries: AtomicU64,
}

impl InMemoryContentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every subsequent write.
    pub fn subscribe(&self, listener: Arc<dyn WriteListener>) -> FolioResult<()> {
        let mut listeners = self.listeners.write().map_err(|_| StorageError::LockPoisoned)?;
        listeners.push(listener);
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }

    /// Add a category without notifying listeners. For seeding.
    pub fn insert_category(&self, category: Category) -> FolioResult<()> {
        let mut categories = self.categories.write().map_err(|_| StorageError::LockPoisoned)?;
        categories.insert(category.category_id, category);
        Ok(())
    }

    /// Create or update a category, then notify listeners.
    pub fn edit_category(&self, category: Category) -> FolioResult<()> {
        let category_id = category.category_id;
        {
            let mut categories =
                self.categories.write().map_err(|_| StorageError::LockPoisoned)?;
            categories.insert(category_id, category);
        }
        self.notify(&WriteEvent::category_edit(category_id))
    }

    /// Create or update a post, then notify listeners.
    ///
    /// Category ids on the post that the store does not know are kept as-is;
    /// they are never reported by [`PrimaryStore::find_category_ids`].
    pub fn save_post(&self, mut post: Post, save: SaveKind) -> FolioResult<()> {
        let post_id = post.post_id;
        post.modified_at = Utc::now();
        {
            let mut posts = self.posts.write().map_err(|_| StorageError::LockPoisoned)?;
            posts.insert(post_id, post);
        }
        self.notify(&WriteEvent::record_save(post_id, save))
    }

    pub fn get_post(&self, post_id: EntityId) -> Option<Post> {
        self.posts.read().ok()?.get(&post_id).cloned()
    }

    pub fn get_category(&self, category_id: EntityId) -> Option<Category> {
        self.categories.read().ok()?.get(&category_id).cloned()
    }

    pub fn category_count(&self) -> usize {
        self.categories.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn post_count(&self) -> usize {
        self.posts.read().map(|p| p.len()).unwrap_or(0)
    }

    /// How many `find_category_ids` calls this store has answered.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    fn notify(&self, event: &WriteEvent) -> FolioResult<()> {
        let listeners: Vec<Arc<dyn WriteListener>> = self
            .listeners
            .read()
            .map_err(|_| StorageError::LockPoisoned)?
            .clone();

        debug!(
            event_id = %event.event_id,
            kind = %event.kind,
            is_autosave = event.is_autosave,
            listeners = listeners.len(),
            "Dispatching write event"
        );
        for listener in &listeners {
            listener.on_write(event);
        }
        Ok(())
    }
}

impl PrimaryStore for InMemoryContentStore {
    fn find_category_ids(&self, limit: usize) -> Vec<EntityId> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if limit == 0 {
            return Vec::new();
        }

        let posts = self.posts.read().unwrap_or_else(|e| e.into_inner());
        let categories = self.categories.read().unwrap_or_else(|e| e.into_inner());

        let published: Vec<&Post> = posts
            .values()
            .filter(|post| post.status.is_published())
            .collect();

        // Categories are keyed by id, so the first `limit` hits are the smallest.
        categories
            .keys()
            .filter(|&id| {
                published
                    .iter()
                    .any(|post| post.category_ids.contains(id))
            })
            .take(limit)
            .copied()
            .collect()
    }
}
