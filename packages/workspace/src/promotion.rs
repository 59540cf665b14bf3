//! Explicit save and temporary-to-permanent id promotion.
//!
//! A draft only becomes a record through `save()`. The save lock is held for
//! the whole round trip, so a second save issued meanwhile is rejected
//! instead of creating a second record.

use campaign_editor::{CanvasPayload, DocumentId, ModulePayload, SaveRequest};

use crate::cache::CacheExt;
use crate::errors::SyncResult;
use crate::session::EditorSession;
use crate::sync::SkipReason;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written under the existing permanent id
    Saved(DocumentId),
    /// First save of a draft; the document now carries `to`
    Promoted { from: DocumentId, to: DocumentId },
    /// Another save was already in progress
    Rejected,
    /// A write guard failed (load in flight, not hydrated, stale id)
    Skipped(SkipReason),
}

impl EditorSession {
    /// Write both sections now, creating the record for a draft
    pub async fn save(&self) -> SyncResult<SaveOutcome> {
        let Ok(_save_guard) = self.inner.save_lock.try_lock() else {
            tracing::debug!("Save already in progress; request ignored");
            return Ok(SaveOutcome::Rejected);
        };

        self.run_flush_handshake();

        let (original, request, canvas, modules) = {
            let state = self.state();
            let doc = state.store.document();
            if !doc.id.is_temporary() {
                if let Some(reason) = state.write_guard(&doc.id) {
                    tracing::debug!("Save of {} skipped: {:?}", doc.id, reason);
                    return Ok(SaveOutcome::Skipped(reason));
                }
            }
            (
                doc.id.clone(),
                SaveRequest::full(doc),
                CanvasPayload::from_document(doc),
                ModulePayload::from_document(doc),
            )
        };

        let record = match self.inner.backend.save(request).await {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!("Saving {} failed: {}", original, err);
                return Err(err);
            }
        };

        let mut guard = self.state();
        let state = &mut *guard;
        if state.store.id() != &original {
            tracing::debug!("Document switched during save of {}; result dropped", original);
            return Ok(SaveOutcome::Saved(original));
        }

        let outcome = if original.is_temporary() {
            let permanent = DocumentId::permanent(record.id.clone());
            state.store.promote(permanent.clone());
            state.selected_id = permanent.clone();
            state.load.in_flight = false;
            state.load.hydrated = true;
            self.inner.navigator.replace(&permanent);
            self.inner.cache.move_name_prompted(&original, &permanent);
            tracing::info!("Promoted draft {} to {}", original, permanent);
            SaveOutcome::Promoted { from: original, to: permanent }
        } else {
            tracing::info!("Saved {}", original);
            SaveOutcome::Saved(original)
        };

        state.cancel_timers();
        state.commit(canvas);
        state.commit(modules);
        // Edits that landed during the round trip still need their own write
        if state.canvas.is_modified() {
            self.arm::<CanvasPayload>(state);
        }
        if state.modules.is_modified() {
            self.arm::<ModulePayload>(state);
        }

        Ok(outcome)
    }
}
