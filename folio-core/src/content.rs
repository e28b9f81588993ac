//! Content records read by derivations.

use crate::{new_entity_id, EntityId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A taxonomy term posts can be filed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: EntityId,
    pub name: String,
    pub slug: String,
}

impl Category {
    /// Create a category with a fresh id. The slug is derived from the name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self {
            category_id: new_entity_id(),
            name,
            slug,
        }
    }
}

/// Lifecycle status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Publish,
    Future,
    Draft,
    Pending,
    Private,
    AutoDraft,
    Trash,
}

impl PostStatus {
    /// Only published posts count towards "attached to published content".
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Publish)
    }
}

/// A content record and its category assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: EntityId,
    pub title: String,
    pub status: PostStatus,
    pub category_ids: Vec<EntityId>,
    pub modified_at: Timestamp,
}

impl Post {
    pub fn new(title: impl Into<String>, status: PostStatus) -> Self {
        Self {
            post_id: new_entity_id(),
            title: title.into(),
            status,
            category_ids: Vec::new(),
            modified_at: Utc::now(),
        }
    }

    /// Attach a category, ignoring duplicates.
    pub fn with_category(mut self, category_id: EntityId) -> Self {
        if !self.category_ids.contains(&category_id) {
            self.category_ids.push(category_id);
        }
        self
    }

    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = status;
        self
    }
}

/// How the current request renders content.
///
/// `Preview` shows unsaved changes, so anything derived from persisted state
/// may be behind what the author sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    Published,
    Preview,
}

impl RenderMode {
    pub fn is_preview(&self) -> bool {
        matches!(self, Self::Preview)
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_slug() {
        assert_eq!(Category::new("Field Notes").slug, "field-notes");
        assert_eq!(Category::new("  Rust & Go!  ").slug, "rust-go");
        assert_eq!(Category::new("").slug, "");
    }

    #[test]
    fn test_post_with_category_dedupes() {
        let cat = Category::new("Travel");
        let post = Post::new("Hello", PostStatus::Publish)
            .with_category(cat.category_id)
            .with_category(cat.category_id);
        assert_eq!(post.category_ids, vec![cat.category_id]);
    }

    #[test]
    fn test_only_publish_counts_as_published() {
        assert!(PostStatus::Publish.is_published());
        for status in [
            PostStatus::Future,
            PostStatus::Draft,
            PostStatus::Pending,
            PostStatus::Private,
            PostStatus::AutoDraft,
            PostStatus::Trash,
        ] {
            assert!(!status.is_published(), "{:?} should not count", status);
        }
    }

    #[test]
    fn test_render_mode_default_is_published() {
        assert_eq!(RenderMode::default(), RenderMode::Published);
        assert!(!RenderMode::Published.is_preview());
        assert!(RenderMode::Preview.is_preview());
    }
}
