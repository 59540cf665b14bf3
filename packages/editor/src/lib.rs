//! # Campaign Editor
//!
//! Core document model and editing engine for the campaign editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ mutations: validated edit operations        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ post_effects: invariant repair              │
//! │  - singleton logo/footer on every screen    │
//! │  - unique module ids                        │
//! │  - at least one launch module               │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ store + history: current document, undo     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ record + hydration: persisted shape, merge  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Nothing in this crate performs I/O or spawns tasks. Timers, persistence
//! and concurrency live in `campaign-workspace`.
//!
//! ## Core Principles
//!
//! 1. **Documents are values**: every edit produces a new `Document`
//! 2. **Invariants are repaired, not reported**: post-effects run after every
//!    mutation and after every merge
//! 3. **Local content wins once it is richer**: hydration never shrinks a
//!    screen the user has filled
//!
//! ## Usage
//!
//! ```rust,ignore
//! use campaign_editor::{
//!     Document, DocumentId, DocumentStore, History, Module, Mutation, ScreenName,
//! };
//!
//! let mut store = DocumentStore::new(Document::blank(DocumentId::temporary()));
//! let mut history = History::new(store.document());
//!
//! let mutation = Mutation::AddModule {
//!     screen: ScreenName::Screen1,
//!     module: Module::text("Welcome"),
//! };
//! store.apply(&mutation)?;
//! history.request(mutation.label());
//! history.settle(store.document());
//!
//! if let Some(snapshot) = history.undo(store.document()) {
//!     store.restore(&snapshot);
//! }
//! ```

mod document;
mod errors;
mod history;
mod hydration;
mod module;
mod mutations;
mod post_effects;
mod record;
mod store;

pub use document::{
    clamp_zoom, Background, BackgroundKind, CanvasElement, DeviceTarget, Document, DocumentId,
    FieldKind, FormField, ScreenName, MAX_ZOOM, MIN_ZOOM,
};
pub use errors::{EditorError, RecordError};
pub use history::{History, HistorySnapshot, DEFAULT_HISTORY_LIMIT};
pub use hydration::{reconcile, HydrationReport, TouchedSlices};
pub use module::{fresh_module_id, FooterLink, Module, ModuleId, ModuleKind, Style, COPY_SUFFIX};
pub use mutations::{
    Applied, ChangeSlice, Direction, EditContext, Mutation, MutationError, Patch,
};
pub use post_effects::{
    DeduplicateModuleIds, PostEffect, PostEffectEngine, PropagateSingletons, ReseedLaunchModule,
    SupersedeStandaloneButtons,
};
pub use record::{CanvasPayload, ModulePayload, PersistSection, PersistedRecord, SaveRequest};
pub use store::{DocumentStore, StoreChange};
