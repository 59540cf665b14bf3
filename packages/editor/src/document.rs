//! # Campaign Document
//!
//! The aggregate root of the editor: every screen's module list, the free
//! canvas elements, per-screen backgrounds, device/zoom view state and the
//! form fields.
//!
//! ## Identity
//!
//! ```text
//! Temporary("temp-…")  ──first successful save──▶  Permanent("…")
//! ```
//!
//! A temporary id only lives in the session. It is never used as a key in the
//! persistence layer.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::module::{find_in, Module, ModuleKind};

/// Zoom bounds for the preview canvas
pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 4.0;

/// Document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentId {
    /// Session-local draft id
    Temporary(String),
    /// Id assigned by the persistence layer
    Permanent(String),
}

impl DocumentId {
    /// Generate a new draft id
    pub fn temporary() -> Self {
        DocumentId::Temporary(format!("temp-{}", Uuid::new_v4().simple()))
    }

    pub fn permanent(id: impl Into<String>) -> Self {
        DocumentId::Permanent(id.into())
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, DocumentId::Temporary(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            DocumentId::Temporary(id) | DocumentId::Permanent(id) => id,
        }
    }

    /// The key to use against the persistence layer, if any
    pub fn persistent_key(&self) -> Option<&str> {
        match self {
            DocumentId::Permanent(id) => Some(id),
            DocumentId::Temporary(_) => None,
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenName {
    Screen1,
    Screen2,
    Screen3,
}

impl ScreenName {
    pub const ALL: [ScreenName; 3] =
        [ScreenName::Screen1, ScreenName::Screen2, ScreenName::Screen3];

    pub fn is_primary(self) -> bool {
        self == ScreenName::Screen1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScreenName::Screen1 => "screen1",
            ScreenName::Screen2 => "screen2",
            ScreenName::Screen3 => "screen3",
        }
    }
}

impl fmt::Display for ScreenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasElement {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundKind {
    Color,
    Gradient,
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Background {
    #[serde(rename = "type")]
    pub kind: BackgroundKind,
    pub value: String,
}

impl Background {
    pub fn color(value: impl Into<String>) -> Self {
        Self { kind: BackgroundKind::Color, value: value.into() }
    }

    pub fn is_default(&self) -> bool {
        *self == Background::default()
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::color("#ffffff")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceTarget {
    #[default]
    Desktop,
    Tablet,
    Mobile,
}

impl DeviceTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceTarget::Desktop => "desktop",
            DeviceTarget::Tablet => "tablet",
            DeviceTarget::Mobile => "mobile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Checkbox,
    Select,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Editable campaign document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub screens: BTreeMap<ScreenName, Vec<Module>>,
    pub canvas_elements: Vec<CanvasElement>,
    pub backgrounds: BTreeMap<ScreenName, Background>,
    pub device: DeviceTarget,
    pub zoom: f64,
    pub form_fields: Vec<FormField>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Empty two-screen document (no modules at all)
    pub fn empty(id: DocumentId) -> Self {
        let mut doc = Self {
            id,
            screens: BTreeMap::new(),
            canvas_elements: Vec::new(),
            backgrounds: BTreeMap::new(),
            device: DeviceTarget::default(),
            zoom: 1.0,
            form_fields: Vec::new(),
            updated_at: None,
        };
        doc.ensure_screens();
        doc
    }

    /// Empty document with the optional exit screen
    pub fn empty_with_exit_screen(id: DocumentId) -> Self {
        let mut doc = Self::empty(id);
        doc.screens.insert(ScreenName::Screen3, Vec::new());
        doc.ensure_screens();
        doc
    }

    /// Fresh editor document: empty screens plus the default launch button
    pub fn blank(id: DocumentId) -> Self {
        let mut doc = Self::empty(id);
        doc.ensure_launch_module(ScreenName::Screen1);
        doc
    }

    /// Append a default button to `screen` (or the primary screen when absent)
    /// if the document has no launch module. Returns whether one was added.
    pub fn ensure_launch_module(&mut self, screen: ScreenName) -> bool {
        if self.has_launch_module() {
            return false;
        }
        let screen = if self.has_screen(screen) { screen } else { ScreenName::Screen1 };
        let label = self.default_launch_label(screen);
        self.screens.entry(screen).or_default().push(Module::button(label));
        true
    }

    /// Restore the "screens are never absent" invariant
    pub fn ensure_screens(&mut self) {
        for screen in [ScreenName::Screen1, ScreenName::Screen2] {
            self.screens.entry(screen).or_default();
        }
        let present: Vec<ScreenName> = self.screens.keys().copied().collect();
        for screen in present {
            self.backgrounds.entry(screen).or_default();
        }
    }

    /// Screens present in this document, in display order
    pub fn screen_names(&self) -> Vec<ScreenName> {
        self.screens.keys().copied().collect()
    }

    pub fn has_screen(&self, screen: ScreenName) -> bool {
        self.screens.contains_key(&screen)
    }

    pub fn modules(&self, screen: ScreenName) -> &[Module] {
        self.screens.get(&screen).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The last screen, when it is not the primary one
    pub fn is_terminal(&self, screen: ScreenName) -> bool {
        !screen.is_primary() && self.screens.keys().next_back() == Some(&screen)
    }

    /// Default label for an auto-created launch button on `screen`
    pub fn default_launch_label(&self, screen: ScreenName) -> &'static str {
        if screen.is_primary() {
            "Participate"
        } else if self.is_terminal(screen) {
            "Replay"
        } else {
            "Continue"
        }
    }

    /// Find a module anywhere in the document
    pub fn find_module(&self, id: &str) -> Option<(ScreenName, &Module)> {
        self.screens
            .iter()
            .find_map(|(screen, modules)| find_in(modules, id).map(|m| (*screen, m)))
    }

    pub fn has_launch_module(&self) -> bool {
        self.screens
            .values()
            .flatten()
            .any(Module::is_launch_capable)
    }

    /// Every module id in the document, nested ones included
    pub fn module_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for modules in self.screens.values() {
            for module in modules {
                module.walk(&mut |m| ids.push(m.id()));
            }
        }
        ids
    }

    /// Ids are unique document-wide; a singleton counts once
    pub fn has_unique_module_ids(&self) -> bool {
        let mut seen = HashSet::new();
        let mut singletons = HashSet::new();
        for modules in self.screens.values() {
            for module in modules {
                let mut ok = true;
                module.walk(&mut |m| {
                    if m.is_singleton() && !singletons.insert(m.id().to_string()) {
                        return;
                    }
                    if !seen.insert(m.id().to_string()) {
                        ok = false;
                    }
                });
                if !ok {
                    return false;
                }
            }
        }
        true
    }

    /// The singleton instance of `kind` on each screen (None where absent)
    pub fn singleton_instances(&self, kind: ModuleKind) -> Vec<(ScreenName, Option<&Module>)> {
        self.screens
            .iter()
            .map(|(screen, modules)| (*screen, modules.iter().find(|m| m.kind() == kind)))
            .collect()
    }

    pub fn module_count(&self) -> usize {
        self.screens.values().map(Vec::len).sum()
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }
}

pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        1.0
    } else {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_both_screens() {
        let doc = Document::empty(DocumentId::temporary());
        assert_eq!(doc.screen_names(), vec![ScreenName::Screen1, ScreenName::Screen2]);
        assert!(doc.modules(ScreenName::Screen1).is_empty());
        assert!(!doc.has_launch_module());
        assert!(doc.backgrounds.values().all(Background::is_default));
    }

    #[test]
    fn test_blank_document_seeds_launch_button() {
        let doc = Document::blank(DocumentId::temporary());
        assert!(doc.has_launch_module());
        assert_eq!(doc.modules(ScreenName::Screen1)[0].label(), Some("Participate"));
    }

    #[test]
    fn test_default_labels_follow_screen_position() {
        let two = Document::empty(DocumentId::temporary());
        assert_eq!(two.default_launch_label(ScreenName::Screen1), "Participate");
        assert_eq!(two.default_launch_label(ScreenName::Screen2), "Replay");

        let three = Document::empty_with_exit_screen(DocumentId::temporary());
        assert_eq!(three.default_launch_label(ScreenName::Screen2), "Continue");
        assert_eq!(three.default_launch_label(ScreenName::Screen3), "Replay");
    }

    #[test]
    fn test_temporary_id_has_no_persistent_key() {
        let temp = DocumentId::temporary();
        assert!(temp.is_temporary());
        assert!(temp.persistent_key().is_none());
        assert!(temp.as_str().starts_with("temp-"));

        let permanent = DocumentId::permanent("abc");
        assert_eq!(permanent.persistent_key(), Some("abc"));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut doc = Document::empty(DocumentId::temporary());
        doc.set_zoom(10.0);
        assert_eq!(doc.zoom, MAX_ZOOM);
        doc.set_zoom(f64::NAN);
        assert_eq!(doc.zoom, 1.0);
    }
}
