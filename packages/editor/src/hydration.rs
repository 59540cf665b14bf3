//! # Hydration Reconciler
//!
//! Merges a freshly fetched remote document into the in-memory one without
//! throwing away richer local content.
//!
//! ## Merge rules
//!
//! - Modules, per screen:
//!   - remote empty → keep local
//!   - remote has more modules than local → adopt remote
//!   - otherwise → keep local (local edits are fresher once non-empty)
//! - Canvas elements: adopt remote only while local is empty and untouched
//! - Backgrounds: adopt remote per screen only while local is the default and
//!   no background was edited this session
//! - Device/zoom: adopt remote while untouched
//! - Form fields: adopt remote while local is empty and untouched
//!
//! Module count is the only richness signal. A screen the user emptied on
//! purpose is refilled when the remote copy still has content for it.

use crate::document::{Document, ScreenName};
use crate::mutations::{ChangeSlice, EditContext};
use crate::post_effects::PostEffectEngine;

/// Slices the user has edited since the document was opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchedSlices {
    pub elements: bool,
    pub backgrounds: bool,
    pub view: bool,
    pub form: bool,
}

impl TouchedSlices {
    pub fn mark(&mut self, slice: ChangeSlice) {
        match slice {
            ChangeSlice::Elements => self.elements = true,
            ChangeSlice::Backgrounds => self.backgrounds = true,
            ChangeSlice::View => self.view = true,
            ChangeSlice::Form => self.form = true,
            // Module screens are merged by count, not by touch
            ChangeSlice::Modules => {}
        }
    }
}

/// What the merge took from the remote side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationReport {
    pub adopted_screens: Vec<ScreenName>,
    pub kept_screens: Vec<ScreenName>,
    pub adopted_elements: bool,
    pub adopted_backgrounds: Vec<ScreenName>,
    pub adopted_view: bool,
    pub adopted_form: bool,
}

impl HydrationReport {
    /// Whether anything at all came from the remote side
    pub fn adopted_anything(&self) -> bool {
        !self.adopted_screens.is_empty()
            || self.adopted_elements
            || !self.adopted_backgrounds.is_empty()
            || self.adopted_view
            || self.adopted_form
    }
}

/// Merge `remote` into `local`; the local id is kept
pub fn reconcile(
    local: &Document,
    remote: &Document,
    touched: &TouchedSlices,
    ctx: &EditContext,
) -> (Document, HydrationReport) {
    let mut merged = local.clone();
    let mut report = HydrationReport::default();

    let screens: Vec<ScreenName> = ScreenName::ALL
        .into_iter()
        .filter(|s| local.has_screen(*s) || remote.has_screen(*s))
        .collect();

    for screen in screens {
        let local_modules = local.modules(screen);
        let remote_modules = remote.modules(screen);

        if !remote_modules.is_empty() && remote_modules.len() > local_modules.len() {
            merged.screens.insert(screen, remote_modules.to_vec());
            report.adopted_screens.push(screen);
        } else if local.has_screen(screen) {
            report.kept_screens.push(screen);
        }
    }

    if !touched.elements && local.canvas_elements.is_empty() && !remote.canvas_elements.is_empty() {
        merged.canvas_elements = remote.canvas_elements.clone();
        report.adopted_elements = true;
    }

    if !touched.backgrounds {
        for (screen, background) in &remote.backgrounds {
            let local_is_default = local
                .backgrounds
                .get(screen)
                .map(|b| b.is_default())
                .unwrap_or(true);
            if local_is_default && !background.is_default() {
                merged.backgrounds.insert(*screen, background.clone());
                report.adopted_backgrounds.push(*screen);
            }
        }
    }

    if !touched.view && (remote.device != local.device || remote.zoom != local.zoom) {
        merged.device = remote.device;
        merged.zoom = remote.zoom;
        report.adopted_view = true;
    }

    if !touched.form && local.form_fields.is_empty() && !remote.form_fields.is_empty() {
        merged.form_fields = remote.form_fields.clone();
        report.adopted_form = true;
    }

    merged.updated_at = remote.updated_at.or(local.updated_at);
    merged.ensure_screens();

    // Mixed adoption can split singletons or collide ids across screens
    if !report.adopted_screens.is_empty() {
        PostEffectEngine::new().repair(&mut merged, ctx);
    }

    (merged, report)
}
