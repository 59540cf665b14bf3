//! Opening documents and hydrating them from the record store.
//!
//! Every `open` bumps a generation counter. A load whose generation is no
//! longer current when it completes is discarded: fetches cannot be
//! cancelled, only ignored.

use campaign_editor::{
    reconcile, CanvasPayload, Document, DocumentId, HydrationReport, ModulePayload,
};

use crate::session::EditorSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Temporary id: nothing to fetch, the draft starts blank
    Fresh,
    Hydrated(HydrationReport),
    NotFound,
    /// Fetch or decode failed; the local document was kept
    Failed,
    /// Another document was opened while this load was in flight
    Stale,
}

impl EditorSession {
    /// Select `id` and hydrate it from the record store
    pub async fn open(&self, id: DocumentId) -> LoadOutcome {
        let (generation, key) = {
            let mut guard = self.state();
            let state = &mut *guard;
            state.load.generation += 1;
            state.selected_id = id.clone();
            state.cancel_timers();

            let Some(key) = id.persistent_key() else {
                if state.store.id() != &id {
                    state.reset_document(Document::blank(id.clone()));
                }
                state.load.in_flight = false;
                state.load.hydrated = true;
                tracing::debug!("Opened draft {}", id);
                return LoadOutcome::Fresh;
            };

            // A remote copy is coming; start without a launch button so the
            // module-count merge does not prefer a placeholder over it
            if state.store.id() != &id {
                state.reset_document(Document::empty(id.clone()));
            }
            state.load.in_flight = true;
            state.load.hydrated = false;
            (state.load.generation, key.to_string())
        };

        let result = self.inner.backend.load(&key).await;

        let mut guard = self.state();
        let state = &mut *guard;
        if state.load.generation != generation || state.selected_id != id {
            tracing::debug!("Discarding stale load of {}", id);
            return LoadOutcome::Stale;
        }
        state.load.in_flight = false;
        state.load.hydrated = true;

        let outcome = match result {
            Ok(Some(record)) => match record.to_document() {
                Ok(remote) => {
                    let ctx = state.store.context();
                    let (merged, report) =
                        reconcile(state.store.document(), &remote, &state.touched, &ctx);
                    state.store.replace(merged);
                    state.adopt_committed(&record);
                    tracing::info!(
                        "Hydrated {}: adopted screens {:?}, kept {:?}",
                        id,
                        report.adopted_screens,
                        report.kept_screens
                    );
                    LoadOutcome::Hydrated(report)
                }
                Err(err) => {
                    tracing::warn!("Record {} is malformed, keeping local document: {}", id, err);
                    LoadOutcome::Failed
                }
            },
            Ok(None) => {
                tracing::debug!("No record for {}, keeping local document", id);
                LoadOutcome::NotFound
            }
            Err(err) => {
                tracing::warn!("Loading {} failed, keeping local document: {}", id, err);
                LoadOutcome::Failed
            }
        };

        let active = state.store.active_screen();
        let mut document = state.store.document().clone();
        if document.ensure_launch_module(active) {
            state.store.replace(document);
        }

        // Snapshots taken before the merge would restore the placeholder
        // document; edits made during the load join the new baseline
        state.history.reset(state.store.document());

        // Edits made while loading were held back by the write guards
        if state.canvas.is_modified() {
            self.arm::<CanvasPayload>(state);
        }
        if state.modules.is_modified() {
            self.arm::<ModulePayload>(state);
        }

        outcome
    }
}
