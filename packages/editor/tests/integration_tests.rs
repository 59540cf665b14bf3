//! Integration tests for editor crate

use campaign_editor::{
    reconcile, Background, Document, DocumentId, DocumentStore, EditContext, History, Module,
    ModuleKind, Mutation, PersistedRecord, SaveRequest, ScreenName, TouchedSlices,
};
use chrono::Utc;
use pretty_assertions::assert_eq;

fn untouched() -> TouchedSlices {
    TouchedSlices::default()
}

#[test]
fn test_delete_only_button_reseeds_primary_default() {
    let mut store = DocumentStore::new(Document::empty(DocumentId::temporary()));
    let button = Module::button("Participate");
    let button_id = button.id().to_string();

    store
        .apply(&Mutation::AddModule { screen: ScreenName::Screen1, module: button })
        .unwrap();
    store.apply(&Mutation::DeleteModule { module_id: button_id.clone() }).unwrap();

    let screen1 = store.document().modules(ScreenName::Screen1);
    assert_eq!(screen1.len(), 1);
    assert_eq!(screen1[0].kind(), ModuleKind::Button);
    assert_eq!(screen1[0].label(), Some("Participate"));
    assert_ne!(screen1[0].id(), button_id);
}

#[test]
fn test_hydration_keeps_local_screen_when_remote_is_empty() {
    let mut local = Document::blank(DocumentId::permanent("c-1"));
    local.screens.insert(
        ScreenName::Screen2,
        vec![Module::text("a"), Module::text("b"), Module::text("c")],
    );
    let expected = local.modules(ScreenName::Screen2).to_vec();

    let remote = Document::empty(DocumentId::permanent("c-1"));
    let (merged, report) = reconcile(&local, &remote, &untouched(), &EditContext::default());

    assert_eq!(merged.modules(ScreenName::Screen2), expected.as_slice());
    assert!(report.kept_screens.contains(&ScreenName::Screen2));
}

#[test]
fn test_hydration_from_persisted_record() {
    let mut saved = Document::blank(DocumentId::permanent("c-7"));
    saved
        .screens
        .insert(ScreenName::Screen2, vec![Module::text("thanks"), Module::button("Replay")]);
    saved.backgrounds.insert(ScreenName::Screen1, Background::color("#abcdef"));
    let record = PersistedRecord::create("c-7", SaveRequest::full(&saved), Utc::now());

    let json = record.to_json().unwrap();
    let remote = PersistedRecord::from_json(&json).unwrap().to_document().unwrap();

    let local = Document::blank(DocumentId::permanent("c-7"));
    let (merged, report) = reconcile(&local, &remote, &untouched(), &EditContext::default());

    assert_eq!(merged.modules(ScreenName::Screen2), saved.modules(ScreenName::Screen2));
    // Same count on screen1, local wins
    assert_eq!(merged.modules(ScreenName::Screen1), local.modules(ScreenName::Screen1));
    assert_eq!(merged.backgrounds[&ScreenName::Screen1], Background::color("#abcdef"));
    assert_eq!(merged.updated_at, record.updated_at);
    assert_eq!(report.adopted_screens, vec![ScreenName::Screen2]);
}

#[test]
fn test_hydration_never_shrinks_any_screen() {
    let mut local = Document::empty_with_exit_screen(DocumentId::permanent("c-1"));
    local.screens.insert(ScreenName::Screen1, vec![Module::button("Go"), Module::text("x")]);
    local.screens.insert(ScreenName::Screen3, vec![Module::text("bye")]);

    let mut remote = Document::empty(DocumentId::permanent("c-1"));
    remote.screens.insert(ScreenName::Screen1, vec![Module::button("Old")]);
    remote.screens.insert(ScreenName::Screen2, vec![Module::text("remote only")]);

    let (merged, _) = reconcile(&local, &remote, &untouched(), &EditContext::default());
    for screen in local.screen_names() {
        assert!(
            merged.modules(screen).len() >= local.modules(screen).len(),
            "{} shrank",
            screen
        );
    }
    assert_eq!(merged.modules(ScreenName::Screen2).len(), 1);
    assert!(merged.has_unique_module_ids());
}

#[test]
fn test_hydration_repairs_split_singletons() {
    let logo = Module::logo("local.png");
    let mut local = Document::empty(DocumentId::permanent("c-1"));
    local.screens.insert(ScreenName::Screen1, vec![logo.clone(), Module::button("Go")]);
    local.screens.insert(ScreenName::Screen2, vec![logo]);

    let mut remote_logo = Module::logo("remote.png");
    remote_logo.set_id("logo-remote".into());
    let mut remote = Document::empty(DocumentId::permanent("c-1"));
    remote.screens.insert(
        ScreenName::Screen2,
        vec![remote_logo, Module::text("a"), Module::text("b")],
    );

    let (merged, _) = reconcile(&local, &remote, &untouched(), &EditContext::default());

    let instances = merged.singleton_instances(ModuleKind::Logo);
    let first = instances[0].1.cloned();
    assert!(first.is_some());
    for (_, instance) in instances {
        assert_eq!(instance.cloned(), first);
    }
}

#[test]
fn test_full_editing_session_round_trip() {
    let mut store = DocumentStore::new(Document::blank(DocumentId::permanent("c-1")));
    let mut history = History::new(store.document());

    let edits = vec![
        Mutation::AddModule { screen: ScreenName::Screen1, module: Module::logo("l.png") },
        Mutation::AddModule { screen: ScreenName::Screen2, module: Module::text("thanks") },
        Mutation::SetBackground {
            screen: ScreenName::Screen2,
            background: Background::color("#000"),
        },
    ];
    for mutation in edits {
        store.apply(&mutation).unwrap();
        history.request(mutation.label());
        history.settle(store.document());
    }

    let record = PersistedRecord::create("c-1", SaveRequest::full(store.document()), Utc::now());
    let reloaded = record.to_document().unwrap();

    assert_eq!(reloaded.screens, store.document().screens);
    assert_eq!(reloaded.backgrounds, store.document().backgrounds);
    assert_eq!(history.undo_levels(), 3);
}
