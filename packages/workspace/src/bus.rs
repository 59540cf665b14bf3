//! Cross-component notifications.
//!
//! Two jobs:
//! - fan out cosmetic style changes to preview renderers without going
//!   through the document store
//! - the flush-before-save handshake: every registered edit surface hands
//!   over the edits it is still holding before a write goes out

use std::sync::{Arc, Mutex, PoisonError};

use campaign_editor::Mutation;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

const BUS_CAPACITY: usize = 256;

/// A style property changed on a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleEvent {
    pub document_id: String,
    pub module_id: String,
    pub property: String,
    pub value: String,
}

/// Edit surface holding state outside the document store
pub trait FlushParticipant: Send + Sync {
    fn name(&self) -> &str;

    /// Hand over (and forget) every pending local edit
    fn take_pending(&self) -> Vec<Mutation>;
}

#[derive(Clone)]
pub struct NotificationBus {
    sender: broadcast::Sender<StyleEvent>,
    participants: Arc<Mutex<Vec<Arc<dyn FlushParticipant>>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            sender,
            participants: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StyleEvent> {
        self.sender.subscribe()
    }

    /// Style events as a stream; lagged receivers yield an error item
    pub fn style_stream(&self) -> BroadcastStream<StyleEvent> {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Returns the number of receivers reached
    pub fn publish(&self, event: StyleEvent) -> usize {
        // No subscribers is fine
        self.sender.send(event).unwrap_or(0)
    }

    pub fn register(&self, participant: Arc<dyn FlushParticipant>) {
        self.participants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(participant);
    }

    pub fn participant_count(&self) -> usize {
        self.participants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run the handshake: drain every participant, in registration order
    pub fn collect_pending(&self) -> Vec<Mutation> {
        let participants = self
            .participants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut pending = Vec::new();
        for participant in participants {
            let edits = participant.take_pending();
            if !edits.is_empty() {
                tracing::debug!(
                    "Flush handshake: {} handed over {} edit(s)",
                    participant.name(),
                    edits.len()
                );
            }
            pending.extend(edits);
        }
        pending
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("subscribers", &self.sender.receiver_count())
            .field("participants", &self.participant_count())
            .finish()
    }
}
