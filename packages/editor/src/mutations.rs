//! # Document Mutations
//!
//! High-level editing operations on a campaign document.
//!
//! ## Design Principles
//!
//! 1. **Value semantics**: applying a mutation produces a new `Document`; the
//!    input is never touched, so every operation is unit-testable on its own
//! 2. **Validated**: unknown ids and malformed patches are rejected before
//!    anything changes
//! 3. **Self-repairing**: invariants (singletons, launch button, unique ids)
//!    are restored by post-effects, never reported as errors
//!
//! ## Mutation Semantics
//!
//! ### AddModule
//! - Inserted at the front of the screen's list
//! - Logo/footer: one shared id cloned onto every screen, replacing the
//!   previous instance of that kind
//! - Colliding ids in the incoming subtree are reassigned
//!
//! ### UpdateModule
//! - Shallow merge of a JSON object patch; `id` and `type` cannot be patched
//! - Value-identical patches leave the document unchanged
//!
//! ### DeleteModule
//! - Removes the module (all instances for a singleton)
//! - The last launch module is replaced by a default button

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::document::{
    clamp_zoom, Background, CanvasElement, DeviceTarget, Document, FormField, ScreenName,
};
use crate::module::{find_in, fresh_module_id, locate_mut, Module, ModuleKind};
use crate::record::PersistSection;

/// Shallow-merge patch (JSON object)
pub type Patch = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

/// Editing operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    AddModule {
        screen: ScreenName,
        module: Module,
    },
    UpdateModule {
        module_id: String,
        patch: Patch,
    },
    DeleteModule {
        module_id: String,
    },
    MoveModule {
        module_id: String,
        direction: Direction,
    },
    DuplicateModule {
        module_id: String,
    },
    AddElement {
        element: CanvasElement,
    },
    UpdateElement {
        element_id: String,
        patch: Patch,
    },
    RemoveElement {
        element_id: String,
    },
    SetBackground {
        screen: ScreenName,
        background: Background,
    },
    SetDevice {
        device: DeviceTarget,
    },
    SetZoom {
        zoom: f64,
    },
    AddFormField {
        field: FormField,
    },
    UpdateFormField {
        field_id: String,
        patch: Patch,
    },
    RemoveFormField {
        field_id: String,
    },
}

/// Part of the document a mutation writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeSlice {
    Modules,
    Elements,
    Backgrounds,
    View,
    Form,
}

impl ChangeSlice {
    /// Persistence channel responsible for this slice
    pub fn section(self) -> PersistSection {
        match self {
            ChangeSlice::Modules | ChangeSlice::Form => PersistSection::Modules,
            ChangeSlice::Elements | ChangeSlice::Backgrounds | ChangeSlice::View => {
                PersistSection::Canvas
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Canvas element not found: {0}")]
    ElementNotFound(String),

    #[error("Form field not found: {0}")]
    FormFieldNotFound(String),

    #[error("Screen not present in document: {0}")]
    ScreenNotFound(ScreenName),

    #[error("Invalid patch: {0}")]
    InvalidPatch(String),

    #[error("Singleton module cannot be duplicated: {0}")]
    CannotDuplicateSingleton(String),
}

/// Session context a mutation runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditContext {
    /// Screen currently shown in the editor
    pub active_screen: ScreenName,
}

impl Default for EditContext {
    fn default() -> Self {
        Self { active_screen: ScreenName::Screen1 }
    }
}

/// Result of applying a mutation
#[derive(Debug, Clone)]
pub struct Applied {
    pub document: Document,
    /// False when the mutation was value-identical to the current state
    pub changed: bool,
}

impl Mutation {
    /// Action label recorded with history snapshots
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::AddModule { .. } => "module_create",
            Mutation::UpdateModule { .. } => "module_update",
            Mutation::DeleteModule { .. } => "module_delete",
            Mutation::MoveModule { .. } => "module_move",
            Mutation::DuplicateModule { .. } => "module_duplicate",
            Mutation::AddElement { .. } => "element_create",
            Mutation::UpdateElement { .. } => "element_update",
            Mutation::RemoveElement { .. } => "element_delete",
            Mutation::SetBackground { .. } => "background_update",
            Mutation::SetDevice { .. } => "device_update",
            Mutation::SetZoom { .. } => "zoom_update",
            Mutation::AddFormField { .. } => "form_field_create",
            Mutation::UpdateFormField { .. } => "form_field_update",
            Mutation::RemoveFormField { .. } => "form_field_delete",
        }
    }

    pub fn slice(&self) -> ChangeSlice {
        match self {
            Mutation::AddModule { .. }
            | Mutation::UpdateModule { .. }
            | Mutation::DeleteModule { .. }
            | Mutation::MoveModule { .. }
            | Mutation::DuplicateModule { .. } => ChangeSlice::Modules,
            Mutation::AddElement { .. }
            | Mutation::UpdateElement { .. }
            | Mutation::RemoveElement { .. } => ChangeSlice::Elements,
            Mutation::SetBackground { .. } => ChangeSlice::Backgrounds,
            Mutation::SetDevice { .. } | Mutation::SetZoom { .. } => ChangeSlice::View,
            Mutation::AddFormField { .. }
            | Mutation::UpdateFormField { .. }
            | Mutation::RemoveFormField { .. } => ChangeSlice::Form,
        }
    }

    /// Whether this mutation is recorded in undo history
    pub fn is_undoable(&self) -> bool {
        self.slice() != ChangeSlice::View
    }

    /// Id of the module this mutation targets, if any
    pub fn target_module(&self) -> Option<&str> {
        match self {
            Mutation::AddModule { module, .. } => Some(module.id()),
            Mutation::UpdateModule { module_id, .. }
            | Mutation::DeleteModule { module_id }
            | Mutation::MoveModule { module_id, .. }
            | Mutation::DuplicateModule { module_id } => Some(module_id),
            _ => None,
        }
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document) -> Result<(), MutationError> {
        match self {
            Mutation::AddModule { screen, .. } | Mutation::SetBackground { screen, .. } => {
                if doc.has_screen(*screen) {
                    Ok(())
                } else {
                    Err(MutationError::ScreenNotFound(*screen))
                }
            }

            Mutation::UpdateModule { module_id, patch } => {
                check_patch_keys(patch, &["id", "type"])?;
                require_module(doc, module_id)
            }

            Mutation::DeleteModule { module_id } | Mutation::MoveModule { module_id, .. } => {
                require_module(doc, module_id)
            }

            Mutation::DuplicateModule { module_id } => {
                let (_, module) = doc
                    .find_module(module_id)
                    .ok_or_else(|| MutationError::ModuleNotFound(module_id.clone()))?;
                if module.is_singleton() {
                    return Err(MutationError::CannotDuplicateSingleton(module_id.clone()));
                }
                Ok(())
            }

            Mutation::UpdateElement { element_id, patch } => {
                check_patch_keys(patch, &["id"])?;
                require_element(doc, element_id)
            }

            Mutation::RemoveElement { element_id } => require_element(doc, element_id),

            Mutation::UpdateFormField { field_id, patch } => {
                check_patch_keys(patch, &["id"])?;
                require_field(doc, field_id)
            }

            Mutation::RemoveFormField { field_id } => require_field(doc, field_id),

            Mutation::AddElement { .. }
            | Mutation::SetDevice { .. }
            | Mutation::SetZoom { .. }
            | Mutation::AddFormField { .. } => Ok(()),
        }
    }

    /// Apply the primary effect of this mutation in place (no invariant repair)
    pub fn apply(&self, doc: &mut Document) -> Result<(), MutationError> {
        self.validate(doc)?;

        match self {
            Mutation::AddModule { screen, module } => {
                Self::apply_add_module(doc, *screen, module);
                Ok(())
            }

            Mutation::UpdateModule { module_id, patch } => {
                Self::apply_update_module(doc, module_id, patch)
            }

            Mutation::DeleteModule { module_id } => {
                for modules in doc.screens.values_mut() {
                    while crate::module::remove_from(modules, module_id).is_some() {}
                }
                Ok(())
            }

            Mutation::MoveModule { module_id, direction } => {
                for modules in doc.screens.values_mut() {
                    if let Some((list, pos)) = locate_mut(modules, module_id) {
                        let neighbour = match direction {
                            Direction::Up => pos.checked_sub(1),
                            Direction::Down => Some(pos + 1).filter(|n| *n < list.len()),
                        };
                        if let Some(neighbour) = neighbour {
                            list.swap(pos, neighbour);
                        }
                        break;
                    }
                }
                Ok(())
            }

            Mutation::DuplicateModule { module_id } => {
                for modules in doc.screens.values_mut() {
                    if let Some((list, pos)) = locate_mut(modules, module_id) {
                        let mut clone = list[pos].deep_clone_fresh();
                        clone.suffix_label_as_copy();
                        list.insert(pos + 1, clone);
                        break;
                    }
                }
                Ok(())
            }

            Mutation::AddElement { element } => {
                let mut element = element.clone();
                if element.id.is_empty() || doc.canvas_elements.iter().any(|e| e.id == element.id) {
                    element.id = format!("element-{}", uuid::Uuid::new_v4().simple());
                }
                doc.canvas_elements.push(element);
                Ok(())
            }

            Mutation::UpdateElement { element_id, patch } => {
                let found = doc.canvas_elements.iter_mut().find(|e| &e.id == element_id);
                if let Some(element) = found {
                    *element = merge_patch(element, patch)?;
                }
                Ok(())
            }

            Mutation::RemoveElement { element_id } => {
                doc.canvas_elements.retain(|e| &e.id != element_id);
                Ok(())
            }

            Mutation::SetBackground { screen, background } => {
                doc.backgrounds.insert(*screen, background.clone());
                Ok(())
            }

            Mutation::SetDevice { device } => {
                doc.device = *device;
                Ok(())
            }

            Mutation::SetZoom { zoom } => {
                doc.zoom = clamp_zoom(*zoom);
                Ok(())
            }

            Mutation::AddFormField { field } => {
                let mut field = field.clone();
                if field.id.is_empty() || doc.form_fields.iter().any(|f| f.id == field.id) {
                    field.id = format!("field-{}", uuid::Uuid::new_v4().simple());
                }
                doc.form_fields.push(field);
                Ok(())
            }

            Mutation::UpdateFormField { field_id, patch } => {
                if let Some(field) = doc.form_fields.iter_mut().find(|f| &f.id == field_id) {
                    *field = merge_patch(field, patch)?;
                }
                Ok(())
            }

            Mutation::RemoveFormField { field_id } => {
                doc.form_fields.retain(|f| &f.id != field_id);
                Ok(())
            }
        }
    }

    fn apply_add_module(doc: &mut Document, screen: ScreenName, module: &Module) {
        let mut module = module.clone();
        let kind = module.kind();

        if kind.is_singleton() {
            // The shared id may only clash with an unrelated module
            let clashes = doc
                .find_module(module.id())
                .map(|(_, existing)| existing.kind() != kind)
                .unwrap_or(false);
            if clashes || module.id().is_empty() {
                module.set_id(fresh_module_id(kind));
            }

            for modules in doc.screens.values_mut() {
                let previous = modules.iter().position(|m| m.kind() == kind);
                modules.retain(|m| m.kind() != kind);
                let index = match (previous, kind) {
                    (Some(pos), _) => pos.min(modules.len()),
                    (None, ModuleKind::Logo) => 0,
                    (None, _) => modules.len(),
                };
                modules.insert(index, module.clone());
            }
            return;
        }

        let mut taken: HashSet<String> = doc.module_ids().into_iter().map(str::to_string).collect();
        module.walk_mut(&mut |m| {
            if m.id().is_empty() || !taken.insert(m.id().to_string()) {
                let fresh = fresh_module_id(m.kind());
                taken.insert(fresh.clone());
                m.set_id(fresh);
            }
        });

        doc.screens.entry(screen).or_default().insert(0, module);
    }

    fn apply_update_module(
        doc: &mut Document,
        module_id: &str,
        patch: &Patch,
    ) -> Result<(), MutationError> {
        let current = doc
            .find_module(module_id)
            .map(|(_, m)| m.clone())
            .ok_or_else(|| MutationError::ModuleNotFound(module_id.to_string()))?;

        let patched: Module = merge_patch(&current, patch)?;
        if patched == current {
            return Ok(());
        }

        // Every instance sharing the id (singletons live on each screen)
        for modules in doc.screens.values_mut() {
            for module in modules.iter_mut() {
                module.walk_mut(&mut |m| {
                    if m.id() == module_id {
                        *m = patched.clone();
                    }
                });
            }
        }
        Ok(())
    }
}

/// Shallow-merge `patch` into the JSON form of `value`
fn merge_patch<T>(value: &T, patch: &Patch) -> Result<T, MutationError>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let mut json =
        serde_json::to_value(value).map_err(|e| MutationError::InvalidPatch(e.to_string()))?;
    let object = json
        .as_object_mut()
        .ok_or_else(|| MutationError::InvalidPatch("target is not an object".to_string()))?;
    for (key, val) in patch {
        object.insert(key.clone(), val.clone());
    }
    serde_json::from_value(json).map_err(|e| MutationError::InvalidPatch(e.to_string()))
}

fn check_patch_keys(patch: &Patch, forbidden: &[&str]) -> Result<(), MutationError> {
    match forbidden.iter().find(|key| patch.contains_key(**key)) {
        Some(key) => Err(MutationError::InvalidPatch(format!("`{}` cannot be patched", key))),
        None => Ok(()),
    }
}

fn require_module(doc: &Document, id: &str) -> Result<(), MutationError> {
    let found = doc.screens.values().any(|modules| find_in(modules, id).is_some());
    if found {
        Ok(())
    } else {
        Err(MutationError::ModuleNotFound(id.to_string()))
    }
}

fn require_element(doc: &Document, id: &str) -> Result<(), MutationError> {
    if doc.canvas_elements.iter().any(|e| e.id == id) {
        Ok(())
    } else {
        Err(MutationError::ElementNotFound(id.to_string()))
    }
}

fn require_field(doc: &Document, id: &str) -> Result<(), MutationError> {
    if doc.form_fields.iter().any(|f| f.id == id) {
        Ok(())
    } else {
        Err(MutationError::FormFieldNotFound(id.to_string()))
    }
}
