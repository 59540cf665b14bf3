//! # Editor Session
//!
//! One open document plus everything that keeps it in sync: the store, the
//! undo history, the two persistence channels and the load bookkeeping.
//!
//! ## Threading
//!
//! All session state sits behind one `std::sync::Mutex` that is never held
//! across an `.await`. Mutation calls are synchronous; persistence runs in
//! spawned tasks and reports back through `is_modified()`.
//!
//! ```text
//! apply(mutation)
//!   ├─ store.apply          (post-effects, version bump)
//!   ├─ history.request      (settled on the next tick)
//!   └─ channel.arm          (canvas 1000 ms / modules 1500 ms)
//!
//! open(id)   → loader.rs     (generation counter, hydration merge)
//! save()     → promotion.rs  (save lock, temporary → permanent id)
//! flush()    → sync.rs       (immediate write of modified channels)
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use campaign_editor::{
    CanvasPayload, ChangeSlice, Document, DocumentId, DocumentStore, History, Module,
    ModulePayload, Mutation, PersistSection, ScreenName, StoreChange, TouchedSlices,
};

use crate::backend::PersistenceBackend;
use crate::bus::{NotificationBus, StyleEvent};
use crate::cache::{CacheExt, LocalCache, MemoryCache};
use crate::config::SyncConfig;
use crate::errors::SyncResult;
use crate::navigation::{Navigator, RouteNavigator};
use crate::sync::Channel;

/// Load bookkeeping for the selected document
#[derive(Debug, Default)]
pub(crate) struct LoadState {
    /// Bumped by every `open`; a load only applies if it still matches
    pub generation: u64,
    pub in_flight: bool,
    pub hydrated: bool,
}

pub(crate) struct SessionState {
    pub store: DocumentStore,
    pub history: History,
    pub touched: TouchedSlices,

    /// Id the surrounding shell currently has selected
    pub selected_id: DocumentId,

    pub load: LoadState,
    pub canvas: Channel<CanvasPayload>,
    pub modules: Channel<ModulePayload>,

    settle_scheduled: bool,
    pub closed: bool,
}

impl SessionState {
    pub fn cancel_timers(&mut self) {
        self.canvas.cancel();
        self.modules.cancel();
    }

    /// Start over with `document` as the unedited baseline
    pub fn reset_document(&mut self, document: Document) {
        self.cancel_timers();
        self.history.reset(&document);
        self.store.replace(document);
        self.touched = TouchedSlices::default();
        self.canvas.reset();
        self.modules.reset();
        self.settle_scheduled = false;
    }
}

pub(crate) struct SessionInner {
    pub state: Mutex<SessionState>,
    pub backend: Arc<dyn PersistenceBackend>,
    pub cache: Arc<dyn LocalCache>,
    pub navigator: Arc<dyn Navigator>,
    pub bus: NotificationBus,
    pub config: SyncConfig,

    /// Held for the whole of any explicit save; autosave only tries it
    pub save_lock: tokio::sync::Mutex<()>,
}

/// Handle to an editor session; clones share the same session
#[derive(Clone)]
pub struct EditorSession {
    pub(crate) inner: Arc<SessionInner>,
}

pub struct SessionBuilder {
    backend: Arc<dyn PersistenceBackend>,
    cache: Option<Arc<dyn LocalCache>>,
    navigator: Option<Arc<dyn Navigator>>,
    bus: Option<NotificationBus>,
    config: SyncConfig,
    document: Option<Document>,
}

impl SessionBuilder {
    pub fn cache(mut self, cache: Arc<dyn LocalCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn bus(mut self, bus: NotificationBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Initial document; defaults to a blank draft with a temporary id
    pub fn document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    pub fn build(self) -> EditorSession {
        let document = self
            .document
            .unwrap_or_else(|| Document::blank(DocumentId::temporary()));
        let selected_id = document.id.clone();
        let history = History::with_limit(&document, self.config.history_limit);

        let state = SessionState {
            store: DocumentStore::new(document),
            history,
            touched: TouchedSlices::default(),
            selected_id,
            load: LoadState::default(),
            canvas: Channel::new(self.config.canvas_debounce()),
            modules: Channel::new(self.config.module_debounce()),
            settle_scheduled: false,
            closed: false,
        };

        EditorSession {
            inner: Arc::new(SessionInner {
                state: Mutex::new(state),
                backend: self.backend,
                cache: self.cache.unwrap_or_else(|| Arc::new(MemoryCache::new())),
                navigator: self.navigator.unwrap_or_else(|| Arc::new(RouteNavigator::new())),
                bus: self.bus.unwrap_or_default(),
                config: self.config,
                save_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }
}

impl EditorSession {
    pub fn builder(backend: Arc<dyn PersistenceBackend>) -> SessionBuilder {
        SessionBuilder {
            backend,
            cache: None,
            navigator: None,
            bus: None,
            config: SyncConfig::default(),
            document: None,
        }
    }

    /// Session over a blank draft with default collaborators
    pub fn new(backend: Arc<dyn PersistenceBackend>) -> Self {
        Self::builder(backend).build()
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn document(&self) -> Document {
        self.state().store.document().clone()
    }

    pub fn id(&self) -> DocumentId {
        self.state().store.id().clone()
    }

    pub fn selected_id(&self) -> DocumentId {
        self.state().selected_id.clone()
    }

    pub fn version(&self) -> u64 {
        self.state().store.version()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.inner.bus
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.inner.navigator
    }

    pub fn active_screen(&self) -> ScreenName {
        self.state().store.active_screen()
    }

    pub fn set_active_screen(&self, screen: ScreenName) {
        self.state().store.set_active_screen(screen);
    }

    /// Unsaved edits in either channel
    pub fn is_modified(&self) -> bool {
        let state = self.state();
        state.canvas.is_modified() || state.modules.is_modified()
    }

    pub fn is_section_modified(&self, section: PersistSection) -> bool {
        let state = self.state();
        match section {
            PersistSection::Canvas => state.canvas.is_modified(),
            PersistSection::Modules => state.modules.is_modified(),
        }
    }

    pub fn is_hydrated(&self) -> bool {
        self.state().load.hydrated
    }

    pub fn is_loading(&self) -> bool {
        self.state().load.in_flight
    }

    pub fn can_undo(&self) -> bool {
        self.state().history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state().history.can_redo()
    }

    /// Apply an edit: store, history capture request, channel arming
    pub fn apply(&self, mutation: Mutation) -> SyncResult<StoreChange> {
        let mut guard = self.state();
        let change = self.apply_locked(&mut guard, &mutation)?;
        drop(guard);

        if change.changed {
            self.publish_style_changes(&mutation);
        }
        Ok(change)
    }

    pub(crate) fn apply_locked(
        &self,
        state: &mut SessionState,
        mutation: &Mutation,
    ) -> SyncResult<StoreChange> {
        let change = state.store.apply(mutation)?;
        if !change.changed {
            return Ok(change);
        }

        let slice = mutation.slice();
        state.touched.mark(slice);
        if mutation.is_undoable() {
            state.history.request(mutation.label());
            self.schedule_settle(state);
        }
        self.arm_section(state, slice.section());

        match mutation {
            Mutation::SetZoom { .. } => {
                let doc = state.store.document();
                self.inner.cache.remember_zoom(doc.device, doc.zoom);
            }
            Mutation::SetDevice { device } => {
                if let Some(zoom) = self.inner.cache.zoom_for(*device) {
                    state.store.apply(&Mutation::SetZoom { zoom })?;
                }
            }
            _ => {}
        }

        Ok(change)
    }

    /// Settle pending history captures one tick after the edit
    fn schedule_settle(&self, state: &mut SessionState) {
        if state.settle_scheduled {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            state.history.settle(state.store.document());
            return;
        };

        state.settle_scheduled = true;
        let weak = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::task::yield_now().await;
            if let Some(inner) = weak.upgrade() {
                let mut guard = inner.state.lock().unwrap_or_else(PoisonError::into_inner);
                let state = &mut *guard;
                state.settle_scheduled = false;
                state.history.settle(state.store.document());
            }
        });
    }

    pub fn undo(&self) -> bool {
        self.step_history(true)
    }

    pub fn redo(&self) -> bool {
        self.step_history(false)
    }

    fn step_history(&self, back: bool) -> bool {
        let mut guard = self.state();
        let state = &mut *guard;

        let snapshot = if back {
            state.history.undo(state.store.document())
        } else {
            state.history.redo(state.store.document())
        };
        let Some(snapshot) = snapshot else {
            return false;
        };

        let before = state.store.document().clone();
        if !state.store.restore(&snapshot) {
            return false;
        }

        let after = state.store.document();
        if before.canvas_elements != after.canvas_elements {
            state.touched.mark(ChangeSlice::Elements);
        }
        if before.backgrounds != after.backgrounds {
            state.touched.mark(ChangeSlice::Backgrounds);
        }
        if before.form_fields != after.form_fields {
            state.touched.mark(ChangeSlice::Form);
        }
        let canvas_changed =
            CanvasPayload::from_document(&before) != CanvasPayload::from_document(after);
        let modules_changed =
            ModulePayload::from_document(&before) != ModulePayload::from_document(after);

        if canvas_changed {
            self.arm_section(state, PersistSection::Canvas);
        }
        if modules_changed {
            self.arm_section(state, PersistSection::Modules);
        }
        let step = if back { "undo" } else { "redo" };
        tracing::debug!("History {} to version {}", step, state.store.version());
        true
    }

    /// Put a copy of a module on the clipboard
    pub fn copy_module(&self, module_id: &str) -> SyncResult<()> {
        let state = self.state();
        let (_, module) = state
            .store
            .document()
            .find_module(module_id)
            .ok_or_else(|| campaign_editor::MutationError::ModuleNotFound(module_id.to_string()))?;
        self.inner.cache.set_clipboard(module);
        Ok(())
    }

    /// Insert the clipboard module on `screen`; returns the new module's id
    pub fn paste_module(&self, screen: ScreenName) -> SyncResult<Option<String>> {
        let Some(module) = self.inner.cache.clipboard() else {
            return Ok(None);
        };
        let module: Module = module.deep_clone_fresh();
        let id = module.id().to_string();
        self.apply(Mutation::AddModule { screen, module })?;
        Ok(Some(id))
    }

    /// Preview-only style change; the document is not touched
    pub fn preview_style(&self, module_id: &str, property: &str, value: &str) -> usize {
        let document_id = self.id().to_string();
        self.inner.bus.publish(StyleEvent {
            document_id,
            module_id: module_id.to_string(),
            property: property.to_string(),
            value: value.to_string(),
        })
    }

    fn publish_style_changes(&self, mutation: &Mutation) {
        let Mutation::UpdateModule { module_id, patch } = mutation else {
            return;
        };
        let Some(style) = patch.get("style").and_then(|s| s.as_object()) else {
            return;
        };
        for (property, value) in style {
            let value = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
            self.preview_style(module_id, property, &value);
        }
    }

    /// Whether the naming prompt still has to be shown for this document
    pub fn needs_name_prompt(&self) -> bool {
        !self.inner.cache.name_prompted(&self.id())
    }

    pub fn mark_name_prompted(&self) {
        self.inner.cache.mark_name_prompted(&self.id());
    }

    /// Apply the edits collaborating surfaces still hold
    pub(crate) fn run_flush_handshake(&self) {
        for mutation in self.inner.bus.collect_pending() {
            if let Err(err) = self.apply(mutation) {
                tracing::warn!("Dropping pending edit from flush handshake: {}", err);
            }
        }
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("EditorSession")
            .field("id", state.store.id())
            .field("version", &state.store.version())
            .field("hydrated", &state.load.hydrated)
            .finish()
    }
}
