//! Write-event subscription for derived values.
//!
//! The content store does not know which derived values depend on it. Each
//! derived value names the write events it cares about in a [`WatchSet`],
//! and is registered with the store as a [`WriteListener`].

use folio_core::{WriteEvent, WriteEventKind};

/// Receiver of write notifications from a primary store.
///
/// Called synchronously, before the write returns to its caller, so any
/// invalidation done here is visible to the next read.
pub trait WriteListener: Send + Sync {
    fn on_write(&self, event: &WriteEvent);
}

/// Which write events invalidate a derived value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSet {
    kinds: Vec<WriteEventKind>,
    ignore_autosave: bool,
}

impl WatchSet {
    /// Watch the given kinds, ignoring autosaves.
    pub fn new(kinds: impl IntoIterator<Item = WriteEventKind>) -> Self {
        let mut watched = Vec::new();
        for kind in kinds {
            if !watched.contains(&kind) {
                watched.push(kind);
            }
        }
        Self {
            kinds: watched,
            ignore_autosave: true,
        }
    }

    /// Category edits and record saves, autosaves excluded.
    pub fn categories() -> Self {
        Self::new([WriteEventKind::CategoryEdit, WriteEventKind::RecordSave])
    }

    /// Watch nothing. The value is only dropped by an explicit `invalidate`.
    pub fn none() -> Self {
        Self::new([])
    }

    /// Whether autosave record saves should invalidate too.
    pub fn include_autosaves(mut self, include: bool) -> Self {
        self.ignore_autosave = !include;
        self
    }

    pub fn kinds(&self) -> &[WriteEventKind] {
        &self.kinds
    }

    pub fn ignores_autosave(&self) -> bool {
        self.ignore_autosave
    }

    /// Whether `event` should invalidate.
    pub fn matches(&self, event: &WriteEvent) -> bool {
        if !self.kinds.contains(&event.kind) {
            return false;
        }
        !(self.ignore_autosave && event.kind == WriteEventKind::RecordSave && event.is_autosave)
    }
}

impl Default for WatchSet {
    fn default() -> Self {
        Self::categories()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{new_entity_id, SaveKind};

    #[test]
    fn test_categories_watch_matches_edits_and_saves() {
        let watch = WatchSet::categories();
        assert!(watch.matches(&WriteEvent::category_edit(new_entity_id())));
        assert!(watch.matches(&WriteEvent::record_save(new_entity_id(), SaveKind::Manual)));
    }

    #[test]
    fn test_autosave_ignored_by_default() {
        let watch = WatchSet::categories();
        assert!(watch.ignores_autosave());
        assert!(!watch.matches(&WriteEvent::record_save(new_entity_id(), SaveKind::Autosave)));
    }

    #[test]
    fn test_autosave_can_be_included() {
        let watch = WatchSet::categories().include_autosaves(true);
        assert!(watch.matches(&WriteEvent::record_save(new_entity_id(), SaveKind::Autosave)));
    }

    #[test]
    fn test_unwatched_kind_ignored() {
        let watch = WatchSet::new([WriteEventKind::CategoryEdit]);
        assert!(!watch.matches(&WriteEvent::record_save(new_entity_id(), SaveKind::Manual)));
        assert!(!WatchSet::none().matches(&WriteEvent::category_edit(new_entity_id())));
    }

    #[test]
    fn test_duplicate_kinds_collapsed() {
        let watch = WatchSet::new([WriteEventKind::RecordSave, WriteEventKind::RecordSave]);
        assert_eq!(watch.kinds(), &[WriteEventKind::RecordSave]);
    }
}
