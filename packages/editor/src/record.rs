//! # Persisted Record Format
//!
//! The shape a document takes in the remote record store. A record is split
//! into two independently written sections, one per persistence channel:
//!
//! ```text
//! { "id": "...",
//!   "canvas":  { "elements": [...], "backgroundsByScreen": {...}, "device": "...", "zoom": 1.0 },
//!   "modules": { "screens": { "screen1": [...], ... }, "formFields": [...] },
//!   "updatedAt": "..." }
//! ```
//!
//! Saves are upserts: a `SaveRequest` only carries the sections it writes and
//! the store keeps whatever else the record already had.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{
    clamp_zoom, Background, CanvasElement, DeviceTarget, Document, DocumentId, FormField,
    ScreenName,
};
use crate::errors::RecordError;
use crate::module::Module;

/// Record section owned by one persistence channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistSection {
    /// Canvas elements, backgrounds, device, zoom
    Canvas,
    /// Module tree and form fields
    Modules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasPayload {
    #[serde(default)]
    pub elements: Vec<CanvasElement>,
    #[serde(default)]
    pub backgrounds_by_screen: BTreeMap<ScreenName, Background>,
    #[serde(default)]
    pub device: DeviceTarget,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_zoom() -> f64 {
    1.0
}

impl CanvasPayload {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            elements: doc.canvas_elements.clone(),
            backgrounds_by_screen: doc.backgrounds.clone(),
            device: doc.device,
            zoom: doc.zoom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePayload {
    #[serde(default)]
    pub screens: BTreeMap<ScreenName, Vec<Module>>,
    #[serde(default)]
    pub form_fields: Vec<FormField>,
}

impl ModulePayload {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            screens: doc.screens.clone(),
            form_fields: doc.form_fields.clone(),
        }
    }
}

/// Upsert request sent to the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    /// `None` asks the store to create a record and assign a permanent id
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<CanvasPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<ModulePayload>,
}

impl SaveRequest {
    /// Both sections of `doc`; temporary ids are never sent as keys
    pub fn full(doc: &Document) -> Self {
        Self {
            id: doc.id.persistent_key().map(str::to_string),
            canvas: Some(CanvasPayload::from_document(doc)),
            modules: Some(ModulePayload::from_document(doc)),
        }
    }

    pub fn canvas(id: &str, payload: CanvasPayload) -> Self {
        Self { id: Some(id.to_string()), canvas: Some(payload), modules: None }
    }

    pub fn modules(id: &str, payload: ModulePayload) -> Self {
        Self { id: Some(id.to_string()), canvas: None, modules: Some(payload) }
    }

    pub fn sections(&self) -> Vec<PersistSection> {
        let mut sections = Vec::new();
        if self.canvas.is_some() {
            sections.push(PersistSection::Canvas);
        }
        if self.modules.is_some() {
            sections.push(PersistSection::Modules);
        }
        sections
    }
}

/// Record as held by the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<CanvasPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<ModulePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PersistedRecord {
    /// New record for `id` from a create request
    pub fn create(id: impl Into<String>, request: SaveRequest, now: DateTime<Utc>) -> Self {
        let mut record = Self {
            id: id.into(),
            canvas: None,
            modules: None,
            updated_at: None,
        };
        record.upsert(request, now);
        record
    }

    /// Overwrite the sections present in `request`
    pub fn upsert(&mut self, request: SaveRequest, now: DateTime<Utc>) {
        if let Some(canvas) = request.canvas {
            self.canvas = Some(canvas);
        }
        if let Some(modules) = request.modules {
            self.modules = Some(modules);
        }
        self.updated_at = Some(now);
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let record: PersistedRecord = serde_json::from_str(json)?;
        if record.id.trim().is_empty() {
            return Err(RecordError::MissingId);
        }
        Ok(record)
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The remote document this record describes; absent sections are empty
    pub fn to_document(&self) -> Result<Document, RecordError> {
        if self.id.trim().is_empty() {
            return Err(RecordError::MissingId);
        }

        let mut doc = Document::empty(DocumentId::permanent(self.id.clone()));
        if let Some(modules) = &self.modules {
            for (screen, list) in &modules.screens {
                doc.screens.insert(*screen, list.clone());
            }
            doc.form_fields = modules.form_fields.clone();
        }
        if let Some(canvas) = &self.canvas {
            doc.canvas_elements = canvas.elements.clone();
            for (screen, background) in &canvas.backgrounds_by_screen {
                doc.backgrounds.insert(*screen, background.clone());
            }
            doc.device = canvas.device;
            doc.zoom = clamp_zoom(canvas.zoom);
        }
        doc.updated_at = self.updated_at;
        doc.ensure_screens();
        Ok(doc)
    }
}
