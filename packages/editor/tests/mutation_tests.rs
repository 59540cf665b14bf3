//! Comprehensive mutation tests

use campaign_editor::{
    Background, CanvasElement, Direction, Document, DocumentId, DocumentStore, FieldKind,
    FormField, Module, ModuleKind, Mutation, MutationError, ScreenName,
};
use serde_json::json;

fn store() -> DocumentStore {
    DocumentStore::new(Document::blank(DocumentId::permanent("c-1")))
}

fn patch(value: serde_json::Value) -> campaign_editor::Patch {
    value.as_object().cloned().unwrap()
}

fn ids(store: &DocumentStore, screen: ScreenName) -> Vec<String> {
    store
        .document()
        .modules(screen)
        .iter()
        .map(|m| m.id().to_string())
        .collect()
}

#[test]
fn test_add_module_goes_to_front() {
    let mut store = store();
    let text = Module::text("Hello");
    let text_id = text.id().to_string();

    store
        .apply(&Mutation::AddModule { screen: ScreenName::Screen1, module: text })
        .unwrap();

    let modules = store.document().modules(ScreenName::Screen1);
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].id(), text_id);
}

#[test]
fn test_add_module_with_taken_id_gets_fresh_id() {
    let mut store = store();
    let existing = store.document().modules(ScreenName::Screen1)[0].id().to_string();

    let mut clash = Module::text("Clash");
    clash.set_id(existing.clone());
    store
        .apply(&Mutation::AddModule { screen: ScreenName::Screen2, module: clash })
        .unwrap();

    let added = &store.document().modules(ScreenName::Screen2)[0];
    assert_ne!(added.id(), existing);
    assert!(store.document().has_unique_module_ids());
}

#[test]
fn test_add_to_missing_screen_fails() {
    let mut store = store();
    let result = store.apply(&Mutation::AddModule {
        screen: ScreenName::Screen3,
        module: Module::text("Nowhere"),
    });
    assert_eq!(result, Err(MutationError::ScreenNotFound(ScreenName::Screen3)));
}

#[test]
fn test_logo_is_mirrored_on_every_screen() {
    let doc = Document::empty_with_exit_screen(DocumentId::permanent("c-1"));
    let mut store = DocumentStore::new(doc);
    let logo = Module::logo("https://cdn.example.com/logo.png");
    let logo_id = logo.id().to_string();

    store
        .apply(&Mutation::AddModule { screen: ScreenName::Screen2, module: logo })
        .unwrap();

    for screen in ScreenName::ALL {
        let modules = store.document().modules(screen);
        assert_eq!(modules[0].kind(), ModuleKind::Logo, "{}", screen);
        assert_eq!(modules[0].id(), logo_id);
    }
}

#[test]
fn test_second_footer_replaces_first() {
    let mut store = store();
    store
        .apply(&Mutation::AddModule { screen: ScreenName::Screen1, module: Module::footer("Old") })
        .unwrap();
    let replacement = Module::footer("New");
    let replacement_id = replacement.id().to_string();
    store
        .apply(&Mutation::AddModule { screen: ScreenName::Screen2, module: replacement })
        .unwrap();

    for (_, footer) in store.document().singleton_instances(ModuleKind::Footer) {
        let footer = footer.expect("footer on every screen");
        assert_eq!(footer.id(), replacement_id);
    }
    let footers = store
        .document()
        .module_ids()
        .into_iter()
        .filter(|id| id.starts_with("footer-"))
        .count();
    assert_eq!(footers, 2);
}

#[test]
fn test_update_singleton_changes_every_instance() {
    let mut store = store();
    let logo = Module::logo("a.png");
    let logo_id = logo.id().to_string();
    store
        .apply(&Mutation::AddModule { screen: ScreenName::Screen1, module: logo })
        .unwrap();

    store
        .apply(&Mutation::UpdateModule {
            module_id: logo_id.clone(),
            patch: patch(json!({ "src": "b.png" })),
        })
        .unwrap();

    for (_, instance) in store.document().singleton_instances(ModuleKind::Logo) {
        match instance {
            Some(Module::Logo { src, .. }) => assert_eq!(src, "b.png"),
            other => panic!("expected logo, got {:?}", other),
        }
    }
}

#[test]
fn test_update_cannot_patch_id_or_type() {
    let mut store = store();
    let id = ids(&store, ScreenName::Screen1)[0].clone();

    for key in ["id", "type"] {
        let result = store.apply(&Mutation::UpdateModule {
            module_id: id.clone(),
            patch: [(key.to_string(), json!("x"))].into_iter().collect(),
        });
        assert!(matches!(result, Err(MutationError::InvalidPatch(_))));
    }
}

#[test]
fn test_update_with_wrong_value_type_is_invalid() {
    let mut store = store();
    let id = ids(&store, ScreenName::Screen1)[0].clone();
    let before = store.document().clone();

    let result = store.apply(&Mutation::UpdateModule {
        module_id: id,
        patch: patch(json!({ "label": 42 })),
    });
    assert!(matches!(result, Err(MutationError::InvalidPatch(_))));
    assert_eq!(store.document(), &before);
}

#[test]
fn test_identical_update_is_a_noop() {
    let mut store = store();
    let id = ids(&store, ScreenName::Screen1)[0].clone();

    let change = store
        .apply(&Mutation::UpdateModule {
            module_id: id,
            patch: patch(json!({ "label": "Participate" })),
        })
        .unwrap();
    assert!(!change.changed);
}

#[test]
fn test_deleting_last_launch_module_reseeds_button() {
    let mut store = store();
    store.set_active_screen(ScreenName::Screen2);
    let id = ids(&store, ScreenName::Screen1)[0].clone();

    store.apply(&Mutation::DeleteModule { module_id: id.clone() }).unwrap();

    assert!(store.document().find_module(&id).is_none());
    assert!(store.document().has_launch_module());
    let reseeded = &store.document().modules(ScreenName::Screen2)[0];
    assert_eq!(reseeded.kind(), ModuleKind::Button);
    assert_eq!(reseeded.label(), Some("Replay"));
}

#[test]
fn test_blanking_button_label_keeps_launch_module() {
    let mut store = store();
    let id = ids(&store, ScreenName::Screen1)[0].clone();

    store
        .apply(&Mutation::UpdateModule { module_id: id, patch: patch(json!({ "label": "" })) })
        .unwrap();

    // A blank button is still a button
    assert_eq!(store.document().module_count(), 1);
}

#[test]
fn test_delete_unknown_module_fails() {
    let mut store = store();
    let result = store.apply(&Mutation::DeleteModule { module_id: "ghost".into() });
    assert_eq!(result, Err(MutationError::ModuleNotFound("ghost".into())));
}

#[test]
fn test_move_swaps_with_neighbour() {
    let mut store = store();
    store
        .apply(&Mutation::AddModule { screen: ScreenName::Screen1, module: Module::text("A") })
        .unwrap();
    let before = ids(&store, ScreenName::Screen1);

    store
        .apply(&Mutation::MoveModule { module_id: before[0].clone(), direction: Direction::Down })
        .unwrap();

    let after = ids(&store, ScreenName::Screen1);
    assert_eq!(after, vec![before[1].clone(), before[0].clone()]);
}

#[test]
fn test_move_past_the_edge_is_a_noop() {
    let mut store = store();
    let id = ids(&store, ScreenName::Screen1)[0].clone();

    let change = store
        .apply(&Mutation::MoveModule { module_id: id, direction: Direction::Up })
        .unwrap();
    assert!(!change.changed);
}

#[test]
fn test_duplicate_inserts_copy_after_original() {
    let mut store = store();
    let id = ids(&store, ScreenName::Screen1)[0].clone();

    store.apply(&Mutation::DuplicateModule { module_id: id.clone() }).unwrap();

    let modules = store.document().modules(ScreenName::Screen1);
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].id(), id);
    assert_ne!(modules[1].id(), id);
    assert_eq!(modules[1].label(), Some("Participate (copy)"));
}

#[test]
fn test_duplicate_card_gives_children_fresh_ids() {
    let mut store = store();
    let card = Module::card(
        Some("Promo".into()),
        vec![Module::text("inner"), Module::button("Go")],
    );
    let card_id = card.id().to_string();
    store
        .apply(&Mutation::AddModule { screen: ScreenName::Screen2, module: card })
        .unwrap();

    store.apply(&Mutation::DuplicateModule { module_id: card_id }).unwrap();

    assert!(store.document().has_unique_module_ids());
    let copy = &store.document().modules(ScreenName::Screen2)[1];
    assert_eq!(copy.label(), Some("Promo (copy)"));
    assert_eq!(copy.children().map(|c| c.len()), Some(2));
}

#[test]
fn test_duplicate_singleton_is_rejected() {
    let mut store = store();
    let logo = Module::logo("a.png");
    let logo_id = logo.id().to_string();
    store
        .apply(&Mutation::AddModule { screen: ScreenName::Screen1, module: logo })
        .unwrap();
    let before = store.document().clone();

    let result = store.apply(&Mutation::DuplicateModule { module_id: logo_id.clone() });
    assert_eq!(result, Err(MutationError::CannotDuplicateSingleton(logo_id)));
    assert_eq!(store.document(), &before);
}

#[test]
fn test_card_with_button_supersedes_standalone_button() {
    let mut store = store();
    let card = Module::card(None, vec![Module::text("Win a prize"), Module::button("")]);

    store
        .apply(&Mutation::AddModule { screen: ScreenName::Screen1, module: card })
        .unwrap();

    let modules = store.document().modules(ScreenName::Screen1);
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].kind(), ModuleKind::Card);
    let button = &modules[0].children().unwrap()[1];
    assert_eq!(button.label(), Some("Participate"));
}

#[test]
fn test_card_without_button_keeps_standalone_button() {
    let mut store = store();
    let card = Module::card(None, vec![Module::text("Just text")]);

    store
        .apply(&Mutation::AddModule { screen: ScreenName::Screen1, module: card })
        .unwrap();

    assert_eq!(store.document().modules(ScreenName::Screen1).len(), 2);
}

#[test]
fn test_canvas_element_lifecycle() {
    let mut store = store();
    let element = CanvasElement {
        id: String::new(),
        kind: "sticker".into(),
        x: 10.0,
        y: 20.0,
        width: 50.0,
        height: 50.0,
        props: Default::default(),
    };

    store.apply(&Mutation::AddElement { element }).unwrap();
    let id = store.document().canvas_elements[0].id.clone();
    assert!(id.starts_with("element-"));

    store
        .apply(&Mutation::UpdateElement {
            element_id: id.clone(),
            patch: patch(json!({ "x": 99.0 })),
        })
        .unwrap();
    assert_eq!(store.document().canvas_elements[0].x, 99.0);

    store.apply(&Mutation::RemoveElement { element_id: id.clone() }).unwrap();
    assert!(store.document().canvas_elements.is_empty());

    let result = store.apply(&Mutation::RemoveElement { element_id: id.clone() });
    assert_eq!(result, Err(MutationError::ElementNotFound(id)));
}

#[test]
fn test_background_and_zoom() {
    let mut store = store();
    store
        .apply(&Mutation::SetBackground {
            screen: ScreenName::Screen2,
            background: Background::color("#222222"),
        })
        .unwrap();
    assert_eq!(store.document().backgrounds[&ScreenName::Screen2], Background::color("#222222"));

    store.apply(&Mutation::SetZoom { zoom: 0.01 }).unwrap();
    assert_eq!(store.document().zoom, campaign_editor::MIN_ZOOM);
}

#[test]
fn test_form_field_lifecycle() {
    let mut store = store();
    let field = FormField {
        id: "email".into(),
        label: "Email".into(),
        kind: FieldKind::Email,
        required: false,
        options: Vec::new(),
    };

    store.apply(&Mutation::AddFormField { field: field.clone() }).unwrap();
    store.apply(&Mutation::AddFormField { field }).unwrap();
    assert_eq!(store.document().form_fields.len(), 2);
    assert_ne!(store.document().form_fields[0].id, store.document().form_fields[1].id);

    store
        .apply(&Mutation::UpdateFormField {
            field_id: "email".into(),
            patch: patch(json!({ "required": true })),
        })
        .unwrap();
    assert!(store.document().form_fields[0].required);

    store.apply(&Mutation::RemoveFormField { field_id: "email".into() }).unwrap();
    assert_eq!(store.document().form_fields.len(), 1);
}

#[test]
fn test_mutation_json_shape() {
    let mutation: Mutation = serde_json::from_value(json!({
        "op": "move_module",
        "module_id": "text-1",
        "direction": "up"
    }))
    .unwrap();
    assert_eq!(
        mutation,
        Mutation::MoveModule { module_id: "text-1".into(), direction: Direction::Up }
    );
}
