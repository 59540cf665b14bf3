//! # Module Tree
//!
//! Content blocks placed on a screen. A module is a tagged variant; `card`
//! is the only container kind and recurses through its `children`.
//!
//! Two kinds are *singleton-shared*: `logo` and `footer`. Conceptually there
//! is one logical instance, cloned with the same id onto every screen.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ModuleId = String;

/// Inline style properties (`property -> value`)
pub type Style = BTreeMap<String, String>;

/// Suffix appended to labels of duplicated modules
pub const COPY_SUFFIX: &str = " (copy)";

/// A content block on a screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Module {
    Text {
        id: ModuleId,
        content: String,
        #[serde(default, skip_serializing_if = "Style::is_empty")]
        style: Style,
    },
    Button {
        id: ModuleId,
        #[serde(default)]
        label: String,
        #[serde(default, skip_serializing_if = "Style::is_empty")]
        style: Style,
    },
    Image {
        id: ModuleId,
        src: String,
        #[serde(default)]
        alt: String,
        #[serde(default, skip_serializing_if = "Style::is_empty")]
        style: Style,
    },
    Video {
        id: ModuleId,
        url: String,
        #[serde(default, skip_serializing_if = "Style::is_empty")]
        style: Style,
    },
    Spacer {
        id: ModuleId,
        height: u32,
    },
    Card {
        id: ModuleId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        children: Vec<Module>,
        #[serde(default, skip_serializing_if = "Style::is_empty")]
        style: Style,
    },
    Logo {
        id: ModuleId,
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(default, skip_serializing_if = "Style::is_empty")]
        style: Style,
    },
    Footer {
        id: ModuleId,
        #[serde(default)]
        text: String,
        #[serde(default)]
        links: Vec<FooterLink>,
        #[serde(default, skip_serializing_if = "Style::is_empty")]
        style: Style,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterLink {
    pub label: String,
    pub href: String,
}

/// Module discriminant, used wherever behaviour depends only on the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Text,
    Button,
    Image,
    Video,
    Spacer,
    Card,
    Logo,
    Footer,
}

impl ModuleKind {
    /// Logo and footer exist once per document, mirrored on every screen
    pub fn is_singleton(self) -> bool {
        matches!(self, ModuleKind::Logo | ModuleKind::Footer)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKind::Text => "text",
            ModuleKind::Button => "button",
            ModuleKind::Image => "image",
            ModuleKind::Video => "video",
            ModuleKind::Spacer => "spacer",
            ModuleKind::Card => "card",
            ModuleKind::Logo => "logo",
            ModuleKind::Footer => "footer",
        }
    }
}

/// Generate a fresh module id for the given kind
pub fn fresh_module_id(kind: ModuleKind) -> ModuleId {
    format!("{}-{}", kind.as_str(), Uuid::new_v4().simple())
}

impl Module {
    /// Create a launch button with a fresh id
    pub fn button(label: impl Into<String>) -> Self {
        Module::Button {
            id: fresh_module_id(ModuleKind::Button),
            label: label.into(),
            style: Style::new(),
        }
    }

    /// Create a text block with a fresh id
    pub fn text(content: impl Into<String>) -> Self {
        Module::Text {
            id: fresh_module_id(ModuleKind::Text),
            content: content.into(),
            style: Style::new(),
        }
    }

    /// Create a card container with a fresh id
    pub fn card(title: Option<String>, children: Vec<Module>) -> Self {
        Module::Card {
            id: fresh_module_id(ModuleKind::Card),
            title,
            children,
            style: Style::new(),
        }
    }

    pub fn logo(src: impl Into<String>) -> Self {
        Module::Logo {
            id: fresh_module_id(ModuleKind::Logo),
            src: src.into(),
            width: None,
            style: Style::new(),
        }
    }

    pub fn footer(text: impl Into<String>) -> Self {
        Module::Footer {
            id: fresh_module_id(ModuleKind::Footer),
            text: text.into(),
            links: Vec::new(),
            style: Style::new(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Module::Text { id, .. }
            | Module::Button { id, .. }
            | Module::Image { id, .. }
            | Module::Video { id, .. }
            | Module::Spacer { id, .. }
            | Module::Card { id, .. }
            | Module::Logo { id, .. }
            | Module::Footer { id, .. } => id,
        }
    }

    pub fn set_id(&mut self, new_id: ModuleId) {
        match self {
            Module::Text { id, .. }
            | Module::Button { id, .. }
            | Module::Image { id, .. }
            | Module::Video { id, .. }
            | Module::Spacer { id, .. }
            | Module::Card { id, .. }
            | Module::Logo { id, .. }
            | Module::Footer { id, .. } => *id = new_id,
        }
    }

    pub fn kind(&self) -> ModuleKind {
        match self {
            Module::Text { .. } => ModuleKind::Text,
            Module::Button { .. } => ModuleKind::Button,
            Module::Image { .. } => ModuleKind::Image,
            Module::Video { .. } => ModuleKind::Video,
            Module::Spacer { .. } => ModuleKind::Spacer,
            Module::Card { .. } => ModuleKind::Card,
            Module::Logo { .. } => ModuleKind::Logo,
            Module::Footer { .. } => ModuleKind::Footer,
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.kind().is_singleton()
    }

    /// Human-readable label, for the kinds that carry one
    pub fn label(&self) -> Option<&str> {
        match self {
            Module::Button { label, .. } => Some(label),
            Module::Card { title, .. } => title.as_deref(),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&[Module]> {
        match self {
            Module::Card { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Module>> {
        match self {
            Module::Card { children, .. } => Some(children),
            _ => None,
        }
    }

    /// A standalone button, or a container holding a button somewhere below it
    pub fn is_launch_capable(&self) -> bool {
        match self {
            Module::Button { .. } => true,
            Module::Card { .. } => self.contains_button(),
            _ => false,
        }
    }

    /// Whether any descendant (not the module itself) is a button
    pub fn contains_button(&self) -> bool {
        self.children()
            .map(|children| children.iter().any(Module::is_launch_capable))
            .unwrap_or(false)
    }

    /// Visit this module and every descendant, depth first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Module)) {
        visit(self);
        if let Some(children) = self.children() {
            for child in children {
                child.walk(visit);
            }
        }
    }

    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Module)) {
        visit(self);
        if let Some(children) = self.children_mut() {
            for child in children {
                child.walk_mut(visit);
            }
        }
    }

    /// Deep copy with fresh ids for this module and all descendants
    pub fn deep_clone_fresh(&self) -> Module {
        let mut clone = self.clone();
        clone.walk_mut(&mut |m| {
            let kind = m.kind();
            m.set_id(fresh_module_id(kind));
        });
        clone
    }

    /// Mark the label (if any) as a copy
    pub fn suffix_label_as_copy(&mut self) {
        match self {
            Module::Button { label, .. } if !label.is_empty() => label.push_str(COPY_SUFFIX),
            Module::Card { title: Some(title), .. } if !title.is_empty() => {
                title.push_str(COPY_SUFFIX)
            }
            _ => {}
        }
    }

    /// Fill blank button labels at any depth with `label`
    pub fn default_blank_button_labels(&mut self, default_label: &str) {
        self.walk_mut(&mut |m| {
            if let Module::Button { label, .. } = m {
                if label.trim().is_empty() {
                    *label = default_label.to_string();
                }
            }
        });
    }

    /// Find a module by id in this subtree
    pub fn find(&self, target: &str) -> Option<&Module> {
        if self.id() == target {
            return Some(self);
        }
        self.children()?.iter().find_map(|c| c.find(target))
    }
}

/// Find a module by id in a list, descending into containers
pub fn find_in<'a>(modules: &'a [Module], target: &str) -> Option<&'a Module> {
    modules.iter().find_map(|m| m.find(target))
}

/// Locate the list (top level or nested) holding `target`, and its position
pub fn locate_mut<'a>(
    modules: &'a mut Vec<Module>,
    target: &str,
) -> Option<(&'a mut Vec<Module>, usize)> {
    if let Some(pos) = modules.iter().position(|m| m.id() == target) {
        return Some((modules, pos));
    }
    for module in modules.iter_mut() {
        if let Some(children) = module.children_mut() {
            if let Some(found) = locate_mut(children, target) {
                return Some(found);
            }
        }
    }
    None
}

/// Remove `target` from a list (at any depth) and return it
pub fn remove_from(modules: &mut Vec<Module>, target: &str) -> Option<Module> {
    let (list, pos) = locate_mut(modules, target)?;
    Some(list.remove(pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_serialization_uses_type_tag() {
        let module = Module::Button {
            id: "button-1".to_string(),
            label: "Go".to_string(),
            style: Style::new(),
        };

        let json = serde_json::to_value(&module).unwrap();
        assert_eq!(json["type"], "button");
        assert_eq!(json["id"], "button-1");

        let back: Module = serde_json::from_value(json).unwrap();
        assert_eq!(back, module);
    }

    #[test]
    fn test_card_with_nested_button_is_launch_capable() {
        let card = Module::card(None, vec![Module::text("hi"), Module::button("Play")]);
        assert!(card.is_launch_capable());
        assert!(card.contains_button());

        let empty_card = Module::card(None, vec![Module::text("hi")]);
        assert!(!empty_card.is_launch_capable());
        assert!(!Module::text("x").is_launch_capable());
    }

    #[test]
    fn test_deep_clone_assigns_fresh_ids_everywhere() {
        let card = Module::card(Some("Promo".into()), vec![Module::button("Play")]);
        let clone = card.deep_clone_fresh();

        assert_ne!(clone.id(), card.id());
        assert_ne!(
            clone.children().unwrap()[0].id(),
            card.children().unwrap()[0].id()
        );
        assert_eq!(clone.label(), Some("Promo"));
    }

    #[test]
    fn test_copy_suffix_only_for_labelled_kinds() {
        let mut button = Module::button("Play");
        button.suffix_label_as_copy();
        assert_eq!(button.label(), Some("Play (copy)"));

        let text = Module::text("body");
        let mut copy = text.clone();
        copy.suffix_label_as_copy();
        assert_eq!(copy, text);
    }

    #[test]
    fn test_remove_from_nested_list() {
        let button = Module::button("Play");
        let button_id = button.id().to_string();
        let mut modules = vec![Module::card(None, vec![Module::text("a"), button])];

        let removed = remove_from(&mut modules, &button_id).unwrap();
        assert_eq!(removed.id(), button_id);
        assert_eq!(modules[0].children().unwrap().len(), 1);
        assert!(remove_from(&mut modules, "missing").is_none());
    }
}
