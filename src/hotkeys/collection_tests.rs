use super::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::actions::FnAction;
use crate::hotkeys::persistence::MemoryStore;
use crate::hotkeys::service::HOTKEY_MESSAGE;
use crate::hotkeys::test_support::{context, RecordingService, ServiceCall, OWNER};

type TestCollection = HotkeyCollection<RecordingService, MemoryStore>;

fn registry() -> (ActionRegistry, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let mut registry = ActionRegistry::new();
    registry.register_fn(
        "Session.ToggleMute",
        FnAction::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            true
        }),
    );
    (registry, count)
}

fn collection_with_store(store: MemoryStore) -> (TestCollection, RecordingService, Arc<AtomicUsize>) {
    let (ctx, service) = context();
    let (actions, count) = registry();
    (HotkeyCollection::new(ctx, store, actions), service, count)
}

fn collection() -> (TestCollection, RecordingService, Arc<AtomicUsize>) {
    collection_with_store(MemoryStore::new(','))
}

fn combo(s: &str) -> KeyCombination {
    KeyCombination::parse(s)
}

fn add_three(collection: &mut TestCollection) -> Vec<HotkeyHandle> {
    vec![
        collection.add_new("One", combo("Ctrl+1"), None, false),
        collection.add_new("Two", combo("Ctrl+2"), None, false),
        collection.add_new("Three", combo("Ctrl+3"), None, false),
    ]
}

fn set_registered(collection: &mut TestCollection, handle: HotkeyHandle, registered: bool) {
    collection
        .edit(handle)
        .unwrap()
        .set_registered(registered)
        .commit()
        .unwrap();
}

fn record_events(collection: &mut TestCollection) -> Rc<RefCell<Vec<CollectionEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    collection.on_changed(move |event| sink.borrow_mut().push(event.clone()));
    events
}

// ============================================
// STRUCTURE
// ============================================

#[test]
fn empty_collection_is_unchecked() {
    let (collection, _, _) = collection();
    assert!(collection.is_empty());
    assert_eq!(collection.all_selected(), TriState::Unchecked);
}

#[test]
fn add_new_registers_and_saves() {
    let (mut collection, service, _) = collection();
    let handle = collection.add_new(
        "Mute",
        combo("Ctrl+Shift+M"),
        Some("Session.ToggleMute".to_string()),
        true,
    );

    let hotkey = collection.get_by_handle(handle).unwrap();
    assert_eq!(hotkey.status(), RegistrationStatus::Registered);
    assert!(hotkey.binding().is_some());
    assert_eq!(service.register_calls(), 1);
    assert_eq!(collection.store().saves(), 1);
    assert_eq!(
        collection.store().lines(),
        vec!["Mute,Ctrl+Shift+M,Session.ToggleMute,True"]
    );
    assert_eq!(collection.all_selected(), TriState::Checked);
}

#[test]
fn add_keeps_insertion_order() {
    let (mut collection, _, _) = collection();
    add_three(&mut collection);
    let names: Vec<&str> = collection.iter().map(|(_, h)| h.name()).collect();
    assert_eq!(names, vec!["One", "Two", "Three"]);
}

#[test]
fn add_existing_hotkey_binds_action() {
    let (mut collection, _, _) = collection();
    let mut hotkey = BindableHotkey::new("Mute", combo("Ctrl+M"), OWNER);
    hotkey.set_action(Some("Session.ToggleMute".to_string()));
    let handle = collection.add(hotkey);
    assert!(collection.get_by_handle(handle).unwrap().binding().is_some());
    assert_eq!(collection.store().saves(), 1);
}

#[test]
fn get_finds_by_registration_id() {
    let (mut collection, _, _) = collection();
    let handle = collection.add_new("Mute", combo("Ctrl+M"), None, true);
    let id = collection.get_by_handle(handle).unwrap().id().unwrap();
    assert_eq!(collection.get(id).unwrap().name(), "Mute");
    assert!(collection.get(id + 100).is_none());
}

#[test]
fn remove_unregisters_before_removal() {
    let (mut collection, service, _) = collection();
    let handle = collection.add_new("Mute", combo("Ctrl+M"), None, true);
    let id = collection.get_by_handle(handle).unwrap().id().unwrap();

    let removed = collection.remove(handle).unwrap();
    assert!(removed.registration().is_disposed());
    assert!(service.calls().contains(&ServiceCall::Unregister { id }));
    assert!(collection.get(id).is_none());
    assert!(collection.is_empty());
    assert_eq!(collection.all_selected(), TriState::Unchecked);
    assert!(collection.remove(handle).is_none());
}

#[test]
fn remove_by_id_removes_matching_entry() {
    let (mut collection, _, _) = collection();
    let handles = add_three(&mut collection);
    set_registered(&mut collection, handles[1], true);
    let id = collection.get_by_handle(handles[1]).unwrap().id().unwrap();

    assert_eq!(collection.remove_by_id(id), 1);
    let names: Vec<&str> = collection.iter().map(|(_, h)| h.name()).collect();
    assert_eq!(names, vec!["One", "Three"]);
    assert_eq!(collection.remove_by_id(id), 0);
}

#[test]
fn remove_all_unregisters_everything_with_one_save() {
    let (mut collection, service, _) = collection();
    let handles = add_three(&mut collection);
    collection.set_all_selected(true);
    let saves = collection.store().saves();
    service.clear_calls();

    collection.remove_all();

    assert!(collection.is_empty());
    assert_eq!(service.unregister_calls(), handles.len());
    assert!(service.live_ids().is_empty());
    assert_eq!(collection.store().saves(), saves + 1);
    assert!(collection.store().lines().is_empty());
}

#[test]
fn reset_restores_defaults() {
    let (mut collection, service, _) = collection();
    collection.add_new("Custom", combo("Ctrl+K"), None, true);
    let defaults = Config::default().get_default_hotkeys();
    let saves = collection.store().saves();

    collection.reset(&defaults).unwrap();

    let names: Vec<&str> = collection.iter().map(|(_, h)| h.name()).collect();
    let expected: Vec<&str> = defaults.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, expected);
    assert!(service.calls().contains(&ServiceCall::Unregister { id: 1 }));
    assert_eq!(collection.store().saves(), saves + 1);
}

// ============================================
// AGGREGATE
// ============================================

#[test]
fn tri_state_follows_members() {
    let (mut collection, _, _) = collection();
    let handles = add_three(&mut collection);
    assert_eq!(collection.all_selected(), TriState::Unchecked);

    for handle in &handles {
        set_registered(&mut collection, *handle, true);
    }
    assert_eq!(collection.all_selected(), TriState::Checked);

    set_registered(&mut collection, handles[1], false);
    assert_eq!(collection.all_selected(), TriState::Indeterminate);

    set_registered(&mut collection, handles[0], false);
    set_registered(&mut collection, handles[2], false);
    assert_eq!(collection.all_selected(), TriState::Unchecked);
}

#[test]
fn set_all_selected_forces_every_member_with_one_save() {
    let (mut collection, service, _) = collection();
    add_three(&mut collection);
    let saves = collection.store().saves();
    let events = record_events(&mut collection);

    collection.set_all_selected(true);

    assert!(collection.iter().all(|(_, h)| h.is_registered()));
    assert_eq!(service.live_ids().len(), 3);
    assert_eq!(collection.all_selected(), TriState::Checked);
    assert_eq!(collection.store().saves(), saves + 1);

    let events = events.borrow();
    let changed = events
        .iter()
        .filter(|e| matches!(e, CollectionEvent::Changed(_)))
        .count();
    assert_eq!(changed, 3);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, CollectionEvent::AllSelectedChanged(_)))
            .collect::<Vec<_>>(),
        vec![&CollectionEvent::AllSelectedChanged(TriState::Checked)]
    );
}

#[test]
fn set_all_selected_false_unregisters_all() {
    let (mut collection, service, _) = collection();
    add_three(&mut collection);
    collection.set_all_selected(true);
    collection.set_all_selected(false);
    assert!(service.live_ids().is_empty());
    assert_eq!(collection.all_selected(), TriState::Unchecked);
}

#[test]
fn failed_member_counts_as_not_selected() {
    let (mut collection, service, _) = collection();
    service.take_key(Key::D2);
    add_three(&mut collection);
    collection.set_all_selected(true);

    assert_eq!(collection.all_selected(), TriState::Indeterminate);
    let two = collection.find_by_name("Two").unwrap();
    assert_eq!(
        collection.get_by_handle(two).unwrap().status(),
        RegistrationStatus::Failed
    );
    assert!(collection.store().lines().contains(&"Two,Ctrl+D2,,False".to_string()));
}

// ============================================
// EDITING
// ============================================

#[test]
fn batched_edit_reregisters_once() {
    let (mut collection, service, _) = collection();
    let handle = collection.add_new("Mute", combo("Ctrl+Shift+M"), None, true);
    assert_eq!(collection.get_by_handle(handle).unwrap().id(), Some(1));
    let saves = collection.store().saves();
    service.clear_calls();

    {
        let mut edit = collection.edit(handle).unwrap();
        edit.set_key(Key::K);
        edit.set_modifier(Modifiers::ALT, true);
        edit.set_name("Mute all");
    }

    assert_eq!(
        service.calls(),
        vec![
            ServiceCall::Unregister { id: 1 },
            ServiceCall::Register {
                id: 2,
                modifiers: Modifiers::ALT | Modifiers::CONTROL | Modifiers::SHIFT,
                key: Key::K,
            },
        ]
    );
    assert_eq!(collection.store().saves(), saves + 1);
    assert_eq!(collection.store().lines(), vec!["Mute all,Alt+Ctrl+Shift+K,,True"]);
}

#[test]
fn dispatch_index_follows_reregistration() {
    let (mut collection, _, count) = collection();
    let handle = collection.add_new(
        "Mute",
        combo("Ctrl+M"),
        Some("Session.ToggleMute".to_string()),
        true,
    );
    collection.edit(handle).unwrap().set_key(Key::N).commit().unwrap();
    let id = collection.get_by_handle(handle).unwrap().id().unwrap();

    assert!(!collection.dispatch(&HostMessage::hotkey(OWNER, 1)));
    assert!(collection.dispatch(&HostMessage::hotkey(OWNER, id)));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn edit_without_changes_does_not_save() {
    let (mut collection, service, _) = collection();
    let handle = collection.add_new("Mute", combo("Ctrl+M"), None, true);
    let saves = collection.store().saves();
    service.clear_calls();

    let changed = collection
        .edit(handle)
        .unwrap()
        .set_combo(combo("Ctrl+M"))
        .set_registered(true)
        .commit()
        .unwrap();

    assert!(!changed);
    assert!(service.calls().is_empty());
    assert_eq!(collection.store().saves(), saves);
}

#[test]
fn edit_action_rebinds() {
    let (mut collection, _, _) = collection();
    let handle = collection.add_new("Mute", combo("Ctrl+M"), None, false);
    assert!(collection.get_by_handle(handle).unwrap().binding().is_none());

    collection
        .edit(handle)
        .unwrap()
        .set_action(Some("Session.ToggleMute".to_string()))
        .set_setting("Notify", "True")
        .commit()
        .unwrap();

    let hotkey = collection.get_by_handle(handle).unwrap();
    assert_eq!(hotkey.binding().unwrap().action_id(), "Session.ToggleMute");
    assert_eq!(hotkey.action_settings(), &[ActionSetting::new("Notify", "True")]);
}

#[test]
fn edit_unknown_handle_is_error() {
    let (mut collection, _, _) = collection();
    let handle = collection.add_new("Mute", combo("Ctrl+M"), None, false);
    collection.remove(handle);
    assert!(matches!(
        collection.edit(handle),
        Err(HotkeyError::UnknownHotkey(_))
    ));
}

#[test]
fn edit_emits_changed_event() {
    let (mut collection, _, _) = collection();
    let handle = collection.add_new("Mute", combo("Ctrl+M"), None, false);
    let events = record_events(&mut collection);
    set_registered(&mut collection, handle, true);
    assert_eq!(
        *events.borrow(),
        vec![
            CollectionEvent::Changed(handle),
            CollectionEvent::AllSelectedChanged(TriState::Checked),
        ]
    );
}

// ============================================
// PERSISTENCE
// ============================================

#[test]
fn load_returns_false_when_nothing_saved() {
    let (mut collection, _, _) = collection();
    assert!(!collection.load().unwrap());
    assert!(collection.is_empty());
}

#[test]
fn load_restores_records_and_registration_without_saving() {
    let records = vec![
        HotkeyRecord::parse_line("Mute,Ctrl+Shift+M,Session.ToggleMute,True", ',').unwrap(),
        HotkeyRecord::parse_line("Idle,Win+I,,False", ',').unwrap(),
    ];
    let (mut collection, service, _) = collection_with_store(MemoryStore::with_records(&records, ','));

    assert!(collection.load().unwrap());

    assert_eq!(collection.len(), 2);
    let mute = collection.find_by_name("Mute").unwrap();
    let idle = collection.find_by_name("Idle").unwrap();
    assert!(collection.get_by_handle(mute).unwrap().is_registered());
    assert!(collection.get_by_handle(mute).unwrap().binding().is_some());
    assert!(!collection.get_by_handle(idle).unwrap().is_registered());
    assert_eq!(service.register_calls(), 1);
    assert_eq!(collection.all_selected(), TriState::Indeterminate);
    assert_eq!(collection.store().saves(), 0);
    assert_eq!(collection.records(), records);
}

#[test]
fn save_writes_live_state() {
    let (mut collection, _, _) = collection();
    add_three(&mut collection);
    collection.save().unwrap();
    assert_eq!(
        collection.store().lines(),
        vec!["One,Ctrl+D1,,False", "Two,Ctrl+D2,,False", "Three,Ctrl+D3,,False"]
    );
}

// ============================================
// DISPATCH
// ============================================

#[test]
fn dispatch_routes_to_bound_action() {
    let (mut collection, _, count) = collection();
    let handle = collection.add_new(
        "Mute",
        combo("Ctrl+M"),
        Some("Session.ToggleMute".to_string()),
        true,
    );
    let id = collection.get_by_handle(handle).unwrap().id().unwrap();

    assert!(collection.dispatch(&HostMessage::hotkey(OWNER, id)));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn dispatch_ignores_foreign_messages() {
    let (mut collection, _, count) = collection();
    let handle = collection.add_new(
        "Mute",
        combo("Ctrl+M"),
        Some("Session.ToggleMute".to_string()),
        true,
    );
    let id = collection.get_by_handle(handle).unwrap().id().unwrap();

    let other_owner = HostMessage::hotkey(OwnerHandle(0x2002), id);
    let other_kind = HostMessage {
        owner: OWNER,
        kind: HOTKEY_MESSAGE + 1,
        id,
    };
    assert!(!collection.dispatch(&other_owner));
    assert!(!collection.dispatch(&other_kind));
    assert!(!collection.dispatch(&HostMessage::hotkey(OWNER, id + 1)));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn dispatch_debounces_repeated_presses() {
    let (mut collection, _, count) = collection();
    let handle = collection.add_new(
        "Mute",
        combo("Ctrl+M"),
        Some("Session.ToggleMute".to_string()),
        true,
    );
    let message = HostMessage::hotkey(OWNER, collection.get_by_handle(handle).unwrap().id().unwrap());
    let start = Instant::now();

    assert!(collection.dispatch_at(&message, start));
    assert!(collection.dispatch_at(&message, start + Duration::from_millis(100)));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    assert!(collection.dispatch_at(&message, start + Duration::from_millis(300)));
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn presses_200ms_apart_both_fire() {
    let (mut collection, _, count) = collection();
    let handle = collection.add_new(
        "Mute",
        combo("Ctrl+M"),
        Some("Session.ToggleMute".to_string()),
        true,
    );
    let message = HostMessage::hotkey(OWNER, collection.get_by_handle(handle).unwrap().id().unwrap());
    let start = Instant::now();
    collection.dispatch_at(&message, start);
    collection.dispatch_at(&message, start + Duration::from_millis(200));
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn subscriber_can_claim_press() {
    let (mut collection, _, _) = collection();
    let handle = collection.add_new("Raw", combo("Ctrl+R"), None, true);
    let id = collection.get_by_handle(handle).unwrap().id().unwrap();
    let message = HostMessage::hotkey(OWNER, id);

    assert!(!collection.dispatch(&message));
    let subscription = collection
        .subscribe_pressed(handle, |event| event.handled = true)
        .unwrap();
    assert!(collection.dispatch(&message));
    assert!(collection.unsubscribe_pressed(handle, subscription));
    assert!(!collection.dispatch(&message));
}

// ============================================
// TEARDOWN
// ============================================

#[test]
fn shutdown_releases_without_saving() {
    let (mut collection, service, _) = collection();
    add_three(&mut collection);
    collection.set_all_selected(true);
    let saves = collection.store().saves();

    collection.shutdown();
    collection.shutdown();

    assert!(collection.is_shut_down());
    assert!(service.live_ids().is_empty());
    assert_eq!(service.unregister_calls(), 3);
    assert_eq!(collection.store().saves(), saves);
    assert!(!collection.dispatch(&HostMessage::hotkey(OWNER, 1)));
}

#[test]
fn drop_releases_hotkeys() {
    let (mut collection, service, _) = collection();
    add_three(&mut collection);
    collection.set_all_selected(true);
    drop(collection);
    assert!(service.live_ids().is_empty());
}

#[test]
fn nothing_registers_after_shutdown() {
    let (mut collection, service, _) = collection();
    let existing = collection.add_new("Early", combo("Ctrl+E"), None, false);
    collection.shutdown();

    let late = collection.add_new("Late", combo("Ctrl+L"), None, true);
    collection.set_all_selected(true);
    set_registered(&mut collection, existing, true);

    assert_eq!(collection.get_by_handle(late).unwrap().status(), RegistrationStatus::Unregistered);
    assert_eq!(service.register_calls(), 0);
    drop(collection);
    assert!(service.live_ids().is_empty());
}

#[test]
fn drop_releases_hotkeys_added_after_shutdown() {
    let (mut collection, service, _) = collection();
    collection.shutdown();

    let mut other = HotkeyContext::new(service.clone(), OWNER);
    let mut hotkey = BindableHotkey::new("Late", combo("Ctrl+L"), OWNER);
    hotkey.set_registered(true, &mut other);
    assert_eq!(service.live_ids().len(), 1);

    collection.add(hotkey);
    drop(collection);
    assert!(service.live_ids().is_empty());
}

#[test]
fn from_config_uses_id_range() {
    let config = Config {
        id_range: Some(crate::config::IdRangeConfig { min: 100, max: 200 }),
        ..Config::default()
    };
    let service = RecordingService::new();
    let (actions, _) = registry();
    let mut collection =
        HotkeyCollection::from_config(service, OWNER, MemoryStore::new(','), actions, &config).unwrap();
    let handle = collection.add_new("Mute", combo("Ctrl+M"), None, true);
    assert_eq!(collection.get_by_handle(handle).unwrap().id(), Some(101));
}
