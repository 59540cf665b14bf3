use std::time::Duration;

use campaign_editor::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};

/// Timing and history settings for an editor session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Quiet period before the canvas section is written
    #[serde(default = "default_canvas_debounce_ms")]
    pub canvas_debounce_ms: u64,

    /// Quiet period before the module section is written
    #[serde(default = "default_module_debounce_ms")]
    pub module_debounce_ms: u64,

    /// Retained undo snapshots
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_canvas_debounce_ms() -> u64 {
    1000
}

fn default_module_debounce_ms() -> u64 {
    1500
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl SyncConfig {
    pub fn canvas_debounce(&self) -> Duration {
        Duration::from_millis(self.canvas_debounce_ms)
    }

    pub fn module_debounce(&self) -> Duration {
        Duration::from_millis(self.module_debounce_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            canvas_debounce_ms: default_canvas_debounce_ms(),
            module_debounce_ms: default_module_debounce_ms(),
            history_limit: default_history_limit(),
        }
    }
}
