//! # Undo/Redo History
//!
//! Linear history of document snapshots with a movable pointer.
//!
//! ## Design
//!
//! - `entries[pointer]` always mirrors the document as last captured
//! - Undo moves the pointer back and hands out the snapshot to restore
//! - Redo moves it forward again
//! - A new capture while the pointer is behind the tip drops the redo branch
//! - Bounded: the oldest entry falls off once `max_entries` is exceeded
//!
//! Capture is decoupled from the mutation that caused it. Callers `request`
//! a capture and `settle` it one tick later, so slices mutated together
//! (elements and background, say) land in a single snapshot.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new(&doc);
//!
//! store.apply(&mutation)?;
//! history.request(mutation.label());
//! history.settle(store.document());
//!
//! if let Some(snapshot) = history.undo(store.document()) {
//!     store.restore(&snapshot);
//! }
//! ```

use std::collections::{BTreeMap, VecDeque};

use crate::document::{Background, CanvasElement, Document, FormField, ScreenName};
use crate::module::Module;

/// Default number of retained snapshots
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Immutable copy of the editable part of a document
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    /// Action that produced this state (diagnostics only)
    pub action: String,
    pub screens: BTreeMap<ScreenName, Vec<Module>>,
    pub canvas_elements: Vec<CanvasElement>,
    pub backgrounds: BTreeMap<ScreenName, Background>,
    pub form_fields: Vec<FormField>,
}

impl HistorySnapshot {
    pub fn capture(action: impl Into<String>, doc: &Document) -> Self {
        Self {
            action: action.into(),
            screens: doc.screens.clone(),
            canvas_elements: doc.canvas_elements.clone(),
            backgrounds: doc.backgrounds.clone(),
            form_fields: doc.form_fields.clone(),
        }
    }

    /// Same editable content, regardless of the action label
    pub fn same_state(&self, other: &HistorySnapshot) -> bool {
        self.screens == other.screens
            && self.canvas_elements == other.canvas_elements
            && self.backgrounds == other.backgrounds
            && self.form_fields == other.form_fields
    }

    /// Write this snapshot's content into `doc`; id and view state are kept
    pub fn restore_into(&self, doc: &mut Document) {
        doc.screens = self.screens.clone();
        doc.canvas_elements = self.canvas_elements.clone();
        doc.backgrounds = self.backgrounds.clone();
        doc.form_fields = self.form_fields.clone();
        doc.ensure_screens();
    }
}

/// Undo/redo history for document editing
#[derive(Debug)]
pub struct History {
    entries: VecDeque<HistorySnapshot>,

    /// Index of the entry matching the current document
    pointer: usize,

    /// Maximum number of retained entries (at least 1)
    max_entries: usize,

    /// Label of a capture requested but not yet settled
    pending: Option<String>,
}

impl History {
    /// Create a history seeded with the current document (default limit 50)
    pub fn new(doc: &Document) -> Self {
        Self::with_limit(doc, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(doc: &Document, max_entries: usize) -> Self {
        let mut history = Self {
            entries: VecDeque::new(),
            pointer: 0,
            max_entries: max_entries.max(1),
            pending: None,
        };
        history.reset(doc);
        history
    }

    /// Drop every entry and start over from `doc`
    pub fn reset(&mut self, doc: &Document) {
        self.entries.clear();
        self.entries.push_back(HistorySnapshot::capture("initial", doc));
        self.pointer = 0;
        self.pending = None;
    }

    /// Ask for a capture on the next `settle`; the first label of a tick wins
    pub fn request(&mut self, action: impl Into<String>) {
        if self.pending.is_none() {
            self.pending = Some(action.into());
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record the pending capture, if any. Returns whether an entry was pushed.
    pub fn settle(&mut self, doc: &Document) -> bool {
        match self.pending.take() {
            Some(action) => self.push(HistorySnapshot::capture(action, doc)),
            None => false,
        }
    }

    /// Push a snapshot, truncating the redo branch
    pub fn push(&mut self, snapshot: HistorySnapshot) -> bool {
        if let Some(current) = self.entries.get(self.pointer) {
            if current.same_state(&snapshot) {
                return false;
            }
        }

        self.entries.truncate(self.pointer + 1);
        self.entries.push_back(snapshot);

        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
        self.pointer = self.entries.len() - 1;
        true
    }

    /// Step back. `doc` settles any capture still pending.
    pub fn undo(&mut self, doc: &Document) -> Option<HistorySnapshot> {
        self.settle(doc);
        if self.pointer == 0 {
            return None;
        }
        self.pointer -= 1;
        self.entries.get(self.pointer).cloned()
    }

    /// Step forward again after an undo
    pub fn redo(&mut self, doc: &Document) -> Option<HistorySnapshot> {
        self.settle(doc);
        if self.pointer + 1 >= self.entries.len() {
            return None;
        }
        self.pointer += 1;
        self.entries.get(self.pointer).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.pointer > 0 || self.pending.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.pointer + 1 < self.entries.len()
    }

    /// Number of undo steps available
    pub fn undo_levels(&self) -> usize {
        self.pointer
    }

    /// Number of redo steps available
    pub fn redo_levels(&self) -> usize {
        self.entries.len() - self.pointer - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label of the action the next undo reverts
    pub fn undo_description(&self) -> Option<&str> {
        if self.pointer == 0 {
            return None;
        }
        self.entries.get(self.pointer).map(|s| s.action.as_str())
    }

    /// Label of the action the next redo reapplies
    pub fn redo_description(&self) -> Option<&str> {
        self.entries.get(self.pointer + 1).map(|s| s.action.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentId;
    use crate::mutations::Mutation;
    use crate::store::DocumentStore;

    fn edit(store: &mut DocumentStore, history: &mut History, mutation: Mutation) {
        store.apply(&mutation).unwrap();
        history.request(mutation.label());
        history.settle(store.document());
    }

    #[test]
    fn test_history_creation() {
        let doc = Document::blank(DocumentId::temporary());
        let history = History::new(&doc);
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_apply_and_undo() {
        let mut store = DocumentStore::new(Document::blank(DocumentId::temporary()));
        let mut history = History::new(store.document());
        let before = store.document().clone();

        edit(&mut store, &mut history, Mutation::AddElement {
            element: CanvasElement {
                id: "el-1".into(),
                kind: "shape".into(),
                x: 1.0,
                y: 2.0,
                width: 3.0,
                height: 4.0,
                props: Default::default(),
            },
        });
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.undo_description(), Some("element_create"));

        let snapshot = history.undo(store.document()).unwrap();
        store.restore(&snapshot);
        assert_eq!(store.document().canvas_elements, before.canvas_elements);
        assert_eq!(history.redo_levels(), 1);
        assert_eq!(history.redo_description(), Some("element_create"));
    }

    #[test]
    fn test_requests_in_one_tick_collapse() {
        let mut store = DocumentStore::new(Document::blank(DocumentId::temporary()));
        let mut history = History::new(store.document());

        store.apply(&Mutation::SetBackground {
            screen: ScreenName::Screen1,
            background: Background::color("#000000"),
        }).unwrap();
        history.request("background_update");
        store.apply(&Mutation::SetBackground {
            screen: ScreenName::Screen2,
            background: Background::color("#111111"),
        }).unwrap();
        history.request("background_update_2");
        history.settle(store.document());

        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.undo_description(), Some("background_update"));
    }

    #[test]
    fn test_identical_state_is_not_recorded() {
        let doc = Document::blank(DocumentId::temporary());
        let mut history = History::new(&doc);
        history.request("noop");
        assert!(!history.settle(&doc));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_max_entries_enforced() {
        let mut store = DocumentStore::new(Document::blank(DocumentId::temporary()));
        let mut history = History::with_limit(store.document(), 3);

        for i in 0..5 {
            edit(&mut store, &mut history, Mutation::SetBackground {
                screen: ScreenName::Screen1,
                background: Background::color(format!("#00000{}", i)),
            });
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.undo_levels(), 2);
    }
}
