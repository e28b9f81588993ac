//! Write events emitted by the content store.
//!
//! A derived-value cache subscribes to these to know when its entry no
//! longer reflects the store.

use crate::{new_entity_id, EntityId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of write that happened on the primary store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteEventKind {
    /// A category was created, renamed or otherwise edited.
    CategoryEdit,
    /// A record (post) was saved.
    RecordSave,
}

impl fmt::Display for WriteEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CategoryEdit => write!(f, "category-edit"),
            Self::RecordSave => write!(f, "record-save"),
        }
    }
}

/// How a record save was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveKind {
    /// An explicit save by an author or API client.
    #[default]
    Manual,
    /// A periodic draft save by the editor.
    Autosave,
}

/// Notification that the primary store was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteEvent {
    pub event_id: EntityId,
    pub kind: WriteEventKind,
    /// Only meaningful for `RecordSave`; always false for category edits.
    pub is_autosave: bool,
    /// The record or category that was written, when known.
    pub subject_id: Option<EntityId>,
    pub occurred_at: Timestamp,
}

impl WriteEvent {
    pub fn category_edit(category_id: EntityId) -> Self {
        Self {
            event_id: new_entity_id(),
            kind: WriteEventKind::CategoryEdit,
            is_autosave: false,
            subject_id: Some(category_id),
            occurred_at: Utc::now(),
        }
    }

    pub fn record_save(post_id: EntityId, save: SaveKind) -> Self {
        Self {
            event_id: new_entity_id(),
            kind: WriteEventKind::RecordSave,
            is_autosave: matches!(save, SaveKind::Autosave),
            subject_id: Some(post_id),
            occurred_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_save_autosave_flag() {
        let id = new_entity_id();
        assert!(!WriteEvent::record_save(id, SaveKind::Manual).is_autosave);
        assert!(WriteEvent::record_save(id, SaveKind::Autosave).is_autosave);
    }

    #[test]
    fn test_category_edit_never_autosave() {
        let event = WriteEvent::category_edit(new_entity_id());
        assert_eq!(event.kind, WriteEventKind::CategoryEdit);
        assert!(!event.is_autosave);
    }

    #[test]
    fn test_kind_display_matches_serde_name() {
        for kind in [WriteEventKind::CategoryEdit, WriteEventKind::RecordSave] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }
}
