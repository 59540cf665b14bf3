//! # Persistence Synchronizer
//!
//! Two debounced write channels, one per record section:
//!
//! | Channel | Content | Debounce |
//! |---|---|---|
//! | canvas  | elements, backgrounds, device, zoom | 1000 ms |
//! | modules | module tree, form fields            | 1500 ms |
//!
//! Every edit re-arms its channel, aborting the previous timer. When a timer
//! fires the write only goes out if all guards hold:
//!
//! 1. the document id is permanent
//! 2. hydration has completed
//! 3. no load is in flight
//! 4. the timer's id is still the selected id
//!
//! and the save lock is free (otherwise the channel re-arms). Payloads that
//! deep-equal the last committed value are not written. A failed write leaves
//! the modified flag set; the next edit or `flush()` retries.

use std::sync::Arc;
use std::time::Duration;

use campaign_editor::{
    CanvasPayload, Document, DocumentId, ModulePayload, PersistSection, PersistedRecord,
    SaveRequest,
};
use tokio::task::AbortHandle;

use crate::errors::SyncResult;
use crate::session::{EditorSession, SessionState};

/// Why a write was not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    TemporaryId,
    NotHydrated,
    LoadInFlight,
    StaleId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Payload equals the last committed value
    Unchanged,
    Skipped(SkipReason),
    /// Save lock held elsewhere; the channel was re-armed
    Busy,
}

/// Debounce state for one record section
#[derive(Debug)]
pub(crate) struct Channel<P> {
    delay: Duration,
    modified: bool,
    pub last_committed: Option<P>,
    timer: Option<AbortHandle>,
    epoch: u64,
}

impl<P> Channel<P> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            modified: false,
            last_committed: None,
            timer: None,
            epoch: 0,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Forget everything about the previous document
    pub fn reset(&mut self) {
        self.cancel();
        self.modified = false;
        self.last_committed = None;
    }
}

/// Section-specific glue between the document and a channel
pub(crate) trait SectionPayload: Clone + PartialEq + Send + Sync + 'static {
    const SECTION: PersistSection;

    fn capture(doc: &Document) -> Self;
    fn request(id: &str, payload: Self) -> SaveRequest;
    fn committed(record: &PersistedRecord) -> Option<Self>;
    fn channel(state: &mut SessionState) -> &mut Channel<Self>;
}

impl SectionPayload for CanvasPayload {
    const SECTION: PersistSection = PersistSection::Canvas;

    fn capture(doc: &Document) -> Self {
        CanvasPayload::from_document(doc)
    }

    fn request(id: &str, payload: Self) -> SaveRequest {
        SaveRequest::canvas(id, payload)
    }

    fn committed(record: &PersistedRecord) -> Option<Self> {
        record.canvas.clone()
    }

    fn channel(state: &mut SessionState) -> &mut Channel<Self> {
        &mut state.canvas
    }
}

impl SectionPayload for ModulePayload {
    const SECTION: PersistSection = PersistSection::Modules;

    fn capture(doc: &Document) -> Self {
        ModulePayload::from_document(doc)
    }

    fn request(id: &str, payload: Self) -> SaveRequest {
        SaveRequest::modules(id, payload)
    }

    fn committed(record: &PersistedRecord) -> Option<Self> {
        record.modules.clone()
    }

    fn channel(state: &mut SessionState) -> &mut Channel<Self> {
        &mut state.modules
    }
}

impl SessionState {
    /// First failing write guard for a write on behalf of `id`
    pub(crate) fn write_guard(&self, id: &DocumentId) -> Option<SkipReason> {
        if id.is_temporary() {
            Some(SkipReason::TemporaryId)
        } else if self.load.in_flight {
            Some(SkipReason::LoadInFlight)
        } else if !self.load.hydrated {
            Some(SkipReason::NotHydrated)
        } else if *id != self.selected_id || id != self.store.id() {
            Some(SkipReason::StaleId)
        } else {
            None
        }
    }

    /// Record a successful write; the flag clears only if nothing changed since
    pub(crate) fn commit<P: SectionPayload>(&mut self, payload: P) {
        let current = P::capture(self.store.document());
        let channel = P::channel(self);
        channel.modified = current != payload;
        channel.last_committed = Some(payload);
    }

    /// Take the committed baselines from a record just read or written
    pub(crate) fn adopt_committed(&mut self, record: &PersistedRecord) {
        self.canvas.last_committed = CanvasPayload::committed(record);
        self.modules.last_committed = ModulePayload::committed(record);
    }
}

impl EditorSession {
    pub(crate) fn arm_section(&self, state: &mut SessionState, section: PersistSection) {
        match section {
            PersistSection::Canvas => self.arm::<CanvasPayload>(state),
            PersistSection::Modules => self.arm::<ModulePayload>(state),
        }
    }

    /// Mark the channel modified and restart its debounce timer
    pub(crate) fn arm<P: SectionPayload>(&self, state: &mut SessionState) {
        let closed = state.closed;
        let id = state.store.id().clone();
        let channel = P::channel(state);
        channel.modified = true;
        channel.cancel();
        channel.epoch += 1;

        if closed {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No runtime; {:?} changes wait for an explicit flush", P::SECTION);
            return;
        };

        let epoch = channel.epoch;
        let delay = channel.delay;
        let weak = Arc::downgrade(&self.inner);
        let task = handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                EditorSession { inner }.fire::<P>(id, epoch).await;
            }
        });
        channel.timer = Some(task.abort_handle());
    }

    async fn fire<P: SectionPayload>(&self, id: DocumentId, epoch: u64) {
        {
            let mut state = self.state();
            let channel = P::channel(&mut state);
            if channel.epoch != epoch {
                return;
            }
            // Detach so re-arming during the write cannot abort it
            channel.timer = None;
        }

        match self.write::<P>(&id).await {
            Ok(WriteOutcome::Skipped(reason)) => {
                tracing::debug!("Skipped {:?} write for {}: {:?}", P::SECTION, id, reason);
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("Autosave of {:?} for {} failed: {}", P::SECTION, id, err);
            }
        }
    }

    /// Write one section on behalf of `id`, honouring every guard
    pub(crate) async fn write<P: SectionPayload>(
        &self,
        id: &DocumentId,
    ) -> SyncResult<WriteOutcome> {
        if let Some(reason) = self.state().write_guard(id) {
            return Ok(WriteOutcome::Skipped(reason));
        }

        let Ok(_save_guard) = self.inner.save_lock.try_lock() else {
            tracing::debug!("Save in progress; re-arming {:?} channel", P::SECTION);
            let mut state = self.state();
            self.arm::<P>(&mut state);
            return Ok(WriteOutcome::Busy);
        };

        self.run_flush_handshake();

        let (key, payload) = {
            let mut guard = self.state();
            if let Some(reason) = guard.write_guard(id) {
                return Ok(WriteOutcome::Skipped(reason));
            }
            let payload = P::capture(guard.store.document());
            let channel = P::channel(&mut guard);
            if channel.last_committed.as_ref() == Some(&payload) {
                channel.modified = false;
                return Ok(WriteOutcome::Unchanged);
            }
            (id.as_str().to_string(), payload)
        };

        let record = self
            .inner
            .backend
            .save(P::request(&key, payload.clone()))
            .await?;

        let mut state = self.state();
        if state.store.id() != id {
            tracing::debug!("Document switched during {:?} write; result dropped", P::SECTION);
            return Ok(WriteOutcome::Written);
        }
        state.commit(payload);
        tracing::info!(
            "Saved {:?} section of {} (updated {:?})",
            P::SECTION,
            record.id,
            record.updated_at
        );
        Ok(WriteOutcome::Written)
    }

    /// Write every modified channel now, bypassing the debounce
    pub async fn flush(&self) -> SyncResult<()> {
        let (id, canvas, modules) = {
            let mut state = self.state();
            state.cancel_timers();
            (
                state.store.id().clone(),
                state.canvas.is_modified(),
                state.modules.is_modified(),
            )
        };

        let canvas = if canvas {
            self.write::<CanvasPayload>(&id).await
        } else {
            Ok(WriteOutcome::Unchanged)
        };
        let modules = if modules {
            self.write::<ModulePayload>(&id).await
        } else {
            Ok(WriteOutcome::Unchanged)
        };

        for outcome in [&canvas, &modules] {
            match outcome {
                Ok(WriteOutcome::Skipped(reason)) => {
                    tracing::debug!("Flush of {} skipped: {:?}", id, reason);
                }
                Err(err) => tracing::warn!("Flush of {} failed: {}", id, err),
                Ok(_) => {}
            }
        }
        canvas?;
        modules?;
        Ok(())
    }

    /// Best-effort final flush; no timers run afterwards
    pub async fn close(&self) {
        if let Err(err) = self.flush().await {
            tracing::warn!("Final flush failed, unsaved changes dropped: {}", err);
        }
        let mut state = self.state();
        state.closed = true;
        state.cancel_timers();
    }
}
