//! Outward-facing reference to the open document (the editor route).

use std::sync::{Mutex, PoisonError};

use campaign_editor::DocumentId;

pub trait Navigator: Send + Sync {
    /// Point the hosting shell at `id`, replacing the current entry
    fn replace(&self, id: &DocumentId);

    /// Current route, if one was set
    fn current(&self) -> Option<String>;
}

/// Keeps `/editor/<id>` routes and their history
#[derive(Debug, Default)]
pub struct RouteNavigator {
    routes: Mutex<Vec<String>>,
}

impl RouteNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route_for(id: &DocumentId) -> String {
        format!("/editor/{}", id.as_str())
    }

    /// Every route set so far, oldest first
    pub fn history(&self) -> Vec<String> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for RouteNavigator {
    fn replace(&self, id: &DocumentId) {
        let route = Self::route_for(id);
        tracing::debug!("Navigating to {}", route);
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }

    fn current(&self) -> Option<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}
