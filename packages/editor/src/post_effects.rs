//! # Post-Effect System
//!
//! Mutations trigger cascading repairs to keep the document consistent.
//!
//! ## Design
//!
//! After the primary mutation is applied, each registered effect inspects the
//! mutation and the resulting document and restores an invariant:
//! - Adding a container with a button → standalone buttons on that screen go
//!   away, blank child labels get the screen's default
//! - Any singleton edit → logo/footer content mirrored on every screen
//! - Pasted or merged content → duplicate module ids reassigned
//! - Deleting the last launch module → default button on the active screen
//!
//! Post-effects are:
//! - **Deterministic**: same mutation and document, same repair
//! - **Idempotent**: running an effect twice changes nothing the second time
//! - **Silent**: invariant violations are repaired, never reported

use std::collections::HashSet;

use crate::document::Document;
use crate::module::{fresh_module_id, ModuleKind};
use crate::mutations::{Applied, EditContext, Mutation, MutationError};

/// Repair step run after a mutation
pub trait PostEffect: std::fmt::Debug + Send + Sync {
    /// Repair `doc` after `mutation` was applied to it
    fn apply(&self, mutation: Option<&Mutation>, doc: &mut Document, ctx: &EditContext);
}

/// A container's embedded button supersedes the screen-level one
#[derive(Debug)]
pub struct SupersedeStandaloneButtons;

impl PostEffect for SupersedeStandaloneButtons {
    fn apply(&self, mutation: Option<&Mutation>, doc: &mut Document, _ctx: &EditContext) {
        let Some(Mutation::AddModule { screen, module }) = mutation else {
            return;
        };
        if module.kind() != ModuleKind::Card || !module.contains_button() {
            return;
        }

        let default_label = doc.default_launch_label(*screen);
        if let Some(modules) = doc.screens.get_mut(screen) {
            modules.retain(|m| m.kind() != ModuleKind::Button);
            // The container was inserted at the front
            if let Some(container) = modules.first_mut() {
                container.default_blank_button_labels(default_label);
            }
        }
    }
}

/// Logo and footer carry identical content on every screen
#[derive(Debug)]
pub struct PropagateSingletons;

impl PropagateSingletons {
    fn propagate(doc: &mut Document, kind: ModuleKind, preferred: Option<&str>) {
        let canonical = preferred
            .and_then(|id| {
                doc.screens
                    .values()
                    .flatten()
                    .find(|m| m.kind() == kind && m.id() == id)
            })
            .or_else(|| doc.screens.values().flatten().find(|m| m.kind() == kind))
            .cloned();

        let Some(canonical) = canonical else {
            return;
        };

        for modules in doc.screens.values_mut() {
            let mut seen = false;
            modules.retain(|m| {
                if m.kind() != kind {
                    return true;
                }
                // Only one instance per screen
                let keep = !seen;
                seen = true;
                keep
            });
            match modules.iter_mut().find(|m| m.kind() == kind) {
                Some(existing) => *existing = canonical.clone(),
                None if kind == ModuleKind::Logo => modules.insert(0, canonical.clone()),
                None => modules.push(canonical.clone()),
            }
        }
    }
}

impl PostEffect for PropagateSingletons {
    fn apply(&self, mutation: Option<&Mutation>, doc: &mut Document, _ctx: &EditContext) {
        let preferred = mutation.and_then(Mutation::target_module);
        for kind in [ModuleKind::Logo, ModuleKind::Footer] {
            Self::propagate(doc, kind, preferred);
        }
    }
}

/// Module ids are unique across the document
#[derive(Debug)]
pub struct DeduplicateModuleIds;

impl PostEffect for DeduplicateModuleIds {
    fn apply(&self, _mutation: Option<&Mutation>, doc: &mut Document, _ctx: &EditContext) {
        if doc.has_unique_module_ids() {
            return;
        }

        let singleton_ids: HashSet<String> = doc
            .screens
            .values()
            .flatten()
            .filter(|m| m.is_singleton())
            .map(|m| m.id().to_string())
            .collect();

        let mut seen: HashSet<String> = HashSet::new();
        for modules in doc.screens.values_mut() {
            for module in modules.iter_mut() {
                if module.is_singleton() {
                    continue;
                }
                module.walk_mut(&mut |m| {
                    let id = m.id().to_string();
                    if singleton_ids.contains(&id) || !seen.insert(id) {
                        let fresh = fresh_module_id(m.kind());
                        seen.insert(fresh.clone());
                        m.set_id(fresh);
                    }
                });
            }
        }
    }
}

/// At least one launch module exists after deletions
#[derive(Debug)]
pub struct ReseedLaunchModule;

impl PostEffect for ReseedLaunchModule {
    fn apply(&self, mutation: Option<&Mutation>, doc: &mut Document, ctx: &EditContext) {
        let removes_content = matches!(
            mutation,
            Some(Mutation::DeleteModule { .. } | Mutation::UpdateModule { .. })
        );
        if removes_content {
            doc.ensure_launch_module(ctx.active_screen);
        }
    }
}

/// Post-effect engine that applies all registered effects
#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl PostEffectEngine {
    /// Create engine with default effects
    pub fn new() -> Self {
        Self {
            effects: vec![
                Box::new(SupersedeStandaloneButtons),
                Box::new(PropagateSingletons),
                Box::new(DeduplicateModuleIds),
                Box::new(ReseedLaunchModule),
            ],
        }
    }

    /// Apply a mutation with all its post-effects, producing a new document
    pub fn apply_with_effects(
        &self,
        mutation: &Mutation,
        doc: &Document,
        ctx: &EditContext,
    ) -> Result<Applied, MutationError> {
        let mut next = doc.clone();
        mutation.apply(&mut next)?;

        for effect in &self.effects {
            effect.apply(Some(mutation), &mut next, ctx);
        }

        let changed = next != *doc;
        Ok(Applied { document: next, changed })
    }

    /// Run every effect without a triggering mutation (used after merges)
    pub fn repair(&self, doc: &mut Document, ctx: &EditContext) {
        for effect in &self.effects {
            effect.apply(None, doc, ctx);
        }
    }
}

impl Default for PostEffectEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Apply `mutation` with the default post-effects, leaving `self` untouched
    pub fn apply(&self, mutation: &Mutation, ctx: &EditContext) -> Result<Applied, MutationError> {
        PostEffectEngine::new().apply_with_effects(mutation, self, ctx)
    }
}
