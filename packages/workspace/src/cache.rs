//! Session-local key/value cache.
//!
//! Holds convenience state only: last zoom per device, the module clipboard
//! and whether a document's name prompt was shown. Nothing in the sync path
//! depends on it, so write failures are logged and dropped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use campaign_editor::{DeviceTarget, DocumentId, Module};

pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

const CLIPBOARD_KEY: &str = "clipboard";

fn zoom_key(device: DeviceTarget) -> String {
    format!("zoom:{}", device.as_str())
}

fn name_prompt_key(id: &DocumentId) -> String {
    format!("name-prompted:{}", id.as_str())
}

/// Typed accessors over any cache
pub trait CacheExt: LocalCache {
    fn zoom_for(&self, device: DeviceTarget) -> Option<f64> {
        self.get(&zoom_key(device))?.parse().ok()
    }

    fn remember_zoom(&self, device: DeviceTarget, zoom: f64) {
        self.set(&zoom_key(device), zoom.to_string());
    }

    fn clipboard(&self) -> Option<Module> {
        let json = self.get(CLIPBOARD_KEY)?;
        match serde_json::from_str(&json) {
            Ok(module) => Some(module),
            Err(err) => {
                tracing::warn!("Ignoring unreadable clipboard entry: {}", err);
                None
            }
        }
    }

    fn set_clipboard(&self, module: &Module) {
        match serde_json::to_string(module) {
            Ok(json) => self.set(CLIPBOARD_KEY, json),
            Err(err) => tracing::warn!("Could not serialize clipboard module: {}", err),
        }
    }

    fn name_prompted(&self, id: &DocumentId) -> bool {
        self.get(&name_prompt_key(id)).is_some()
    }

    fn mark_name_prompted(&self, id: &DocumentId) {
        self.set(&name_prompt_key(id), "true".to_string());
    }

    /// Carry the name-prompt flag over to a promoted id
    fn move_name_prompted(&self, from: &DocumentId, to: &DocumentId) {
        if self.name_prompted(from) {
            self.mark_name_prompted(to);
            self.remove(&name_prompt_key(from));
        }
    }
}

impl<T: LocalCache + ?Sized> CacheExt for T {}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries().remove(key);
    }
}

/// Cache persisted as a single JSON object, read eagerly on open
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileCache {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|err| {
                tracing::warn!("Discarding unreadable cache {}: {}", path.display(), err);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, entries: Mutex::new(entries) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_through(&self, entries: &BTreeMap<String, String>) {
        let result = serde_json::to_string_pretty(entries)
            .map_err(std::io::Error::from)
            .and_then(|json| {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, json)
            });
        if let Err(err) = result {
            tracing::warn!("Could not write cache {}: {}", self.path.display(), err);
        }
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        let mut entries = self.entries();
        entries.insert(key.to_string(), value);
        self.write_through(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries();
        if entries.remove(key).is_some() {
            self.write_through(&entries);
        }
    }
}
