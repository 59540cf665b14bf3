//! # Document Store
//!
//! Holds the document being edited plus the editor's active screen.
//!
//! Every changing mutation produces a new `Document` value that replaces the
//! current one and bumps the version. Value-identical mutations leave both
//! untouched so callers can skip history capture and persistence.

use crate::document::{Document, DocumentId, ScreenName};
use crate::history::HistorySnapshot;
use crate::mutations::{EditContext, Mutation, MutationError};
use crate::post_effects::PostEffectEngine;

/// Outcome of a store mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    /// New version number
    pub version: u64,
    /// False when the mutation was a no-op
    pub changed: bool,
}

#[derive(Debug)]
pub struct DocumentStore {
    document: Document,

    /// Current version number (increments on each change)
    version: u64,

    active_screen: ScreenName,

    effects: PostEffectEngine,
}

impl DocumentStore {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            version: 0,
            active_screen: ScreenName::Screen1,
            effects: PostEffectEngine::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn id(&self) -> &DocumentId {
        &self.document.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn active_screen(&self) -> ScreenName {
        self.active_screen
    }

    /// Switch the active screen (ignored for screens the document lacks)
    pub fn set_active_screen(&mut self, screen: ScreenName) {
        if self.document.has_screen(screen) {
            self.active_screen = screen;
        }
    }

    pub fn context(&self) -> EditContext {
        EditContext { active_screen: self.active_screen }
    }

    /// Apply a mutation with its post-effects
    pub fn apply(&mut self, mutation: &Mutation) -> Result<StoreChange, MutationError> {
        let applied = self
            .effects
            .apply_with_effects(mutation, &self.document, &self.context())?;

        if applied.changed {
            self.document = applied.document;
            self.version += 1;
        }

        Ok(StoreChange { version: self.version, changed: applied.changed })
    }

    /// Replace the whole document (open, hydration)
    pub fn replace(&mut self, document: Document) {
        if !document.has_screen(self.active_screen) {
            self.active_screen = ScreenName::Screen1;
        }
        self.document = document;
        self.version += 1;
    }

    /// Restore the editable state captured in a history snapshot
    pub fn restore(&mut self, snapshot: &HistorySnapshot) -> bool {
        let mut next = self.document.clone();
        snapshot.restore_into(&mut next);
        if next == self.document {
            return false;
        }
        self.replace(next);
        true
    }

    /// Swap in the permanent identifier after the first successful save
    pub fn promote(&mut self, permanent: DocumentId) {
        self.document.id = permanent;
        self.version += 1;
    }

    /// Run invariant repair on the current document
    pub fn repair(&mut self) {
        let ctx = self.context();
        let mut next = self.document.clone();
        self.effects.repair(&mut next, &ctx);
        if next != self.document {
            self.replace(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_version_increments_only_on_change() {
        let mut store = DocumentStore::new(Document::blank(DocumentId::temporary()));
        assert_eq!(store.version(), 0);

        let id = store.document().modules(ScreenName::Screen1)[0].id().to_string();
        let noop = Mutation::MoveModule {
            module_id: id,
            direction: crate::mutations::Direction::Down,
        };
        let change = store.apply(&noop).unwrap();
        assert!(!change.changed);
        assert_eq!(store.version(), 0);

        let change = store.apply(&Mutation::SetZoom { zoom: 2.0 }).unwrap();
        assert!(change.changed);
        assert_eq!(change.version, 1);
    }

    #[test]
    fn test_failed_mutation_leaves_store_untouched() {
        let mut store = DocumentStore::new(Document::blank(DocumentId::temporary()));
        let before = store.document().clone();

        let result = store.apply(&Mutation::DeleteModule { module_id: "missing".into() });
        assert!(result.is_err());
        assert_eq!(store.document(), &before);
    }

    #[test]
    fn test_active_screen_must_exist() {
        let mut store = DocumentStore::new(Document::empty(DocumentId::temporary()));
        store.set_active_screen(ScreenName::Screen3);
        assert_eq!(store.active_screen(), ScreenName::Screen1);
        store.set_active_screen(ScreenName::Screen2);
        assert_eq!(store.active_screen(), ScreenName::Screen2);
    }
}
