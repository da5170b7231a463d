//! Notification fan-out across loaded resources.
//!
//! Stub resources build plain dependency chains from text files; datasheet
//! scenarios use references between `.skill` and `.restriction` documents.

use vellum_core::test_utils::{
    EventRecorder, StubResource, cleanup, make_test_dir, stub_manager, write_file,
};
use vellum_core::{ListenerHandle, Resource, ResourceError, ResourceEvent, ResourceEventKind};
use vellum_data::Datasheet;
use vellum_data::test_utils::{Restriction, Skill, datasheet_manager};

const EDITOR: ListenerHandle = ListenerHandle(1);
const PANEL: ListenerHandle = ListenerHandle(2);

// ===========================================================================
// Update ordering
// ===========================================================================

/// A depends on B depends on C.
#[test_log::test]
fn updates_reach_direct_referencers_only() {
    let dir = make_test_dir("it_update_chain");
    write_file(&dir, "A.stub", "B.stub");
    write_file(&dir, "B.stub", "C.stub");
    write_file(&dir, "C.stub", "");
    let mut manager = stub_manager(&dir);

    manager.load("A.stub", None).unwrap();
    let a = manager.key_of("A.stub").unwrap();
    let b = manager.key_of("B.stub").unwrap();
    let c = manager.key_of("C.stub").unwrap();

    let recorder = EventRecorder::new();
    for id in ["A.stub", "B.stub", "C.stub"] {
        manager
            .register_listener(id, EDITOR, recorder.listener())
            .unwrap();
    }

    manager.notify_updated("C.stub").unwrap();
    assert_eq!(
        recorder.events(),
        vec![
            ResourceEvent::of_dependency(b, ResourceEventKind::DependencyUpdated, c),
            ResourceEvent::own(c, ResourceEventKind::ResourceUpdated),
        ]
    );
    let b_stub = manager.get_as::<StubResource>("B.stub").unwrap();
    assert_eq!(b_stub.updated(), &[c]);
    let a_stub = manager.get_as::<StubResource>("A.stub").unwrap();
    assert!(a_stub.updated().is_empty());

    recorder.clear();
    manager.notify_updated("B.stub").unwrap();
    assert_eq!(
        recorder.events(),
        vec![
            ResourceEvent::of_dependency(a, ResourceEventKind::DependencyUpdated, b),
            ResourceEvent::own(b, ResourceEventKind::ResourceUpdated),
        ]
    );
    let a_stub = manager.get_as::<StubResource>("A.stub").unwrap();
    assert_eq!(a_stub.updated(), &[b]);

    cleanup(&dir);
}

#[test]
fn listeners_fire_in_registration_order() {
    let dir = make_test_dir("it_listener_order");
    write_file(&dir, "Hub.stub", "");
    write_file(&dir, "Spoke.stub", "Hub.stub");
    let mut manager = stub_manager(&dir);
    manager.preload_all();

    let editor = EventRecorder::new();
    let panel = EventRecorder::new();
    let shared = EventRecorder::new();
    manager
        .register_listener("Hub.stub", EDITOR, editor.listener())
        .unwrap();
    manager
        .register_listener("Hub.stub", PANEL, panel.listener())
        .unwrap();
    manager
        .register_listener("Hub.stub", PANEL, shared.listener())
        .unwrap();

    manager.update_resource("Hub.stub").unwrap();
    assert_eq!(editor.events().len(), 1);
    assert_eq!(panel.events(), shared.events());

    // Tearing the panel down removes both of its entries.
    assert_eq!(manager.unregister_all_listeners(PANEL), 2);
    manager.notify_updated("Hub.stub").unwrap();
    assert_eq!(editor.events().len(), 2);
    assert_eq!(panel.events().len(), 1);

    assert_eq!(manager.unregister_listener("Hub.stub", EDITOR), 1);
    let hub = manager.key_of("Hub.stub").unwrap();
    assert_eq!(manager.dependency_graph().listener_count(hub), 0);

    cleanup(&dir);
}

#[test]
fn listeners_need_a_tracked_resource() {
    let dir = make_test_dir("it_untracked_listener");
    write_file(&dir, "Idle.stub", "");
    let mut manager = stub_manager(&dir);

    let err = manager
        .register_listener("Idle.stub", EDITOR, EventRecorder::new().listener())
        .unwrap_err();
    assert!(matches!(err, ResourceError::ListenerOnUntrackedResource(id) if id == "Idle.stub"));

    cleanup(&dir);
}

// ===========================================================================
// Removal
// ===========================================================================

#[test_log::test]
fn removal_notifies_before_unlinking() {
    let dir = make_test_dir("it_removal");
    write_file(
        &dir,
        "RestrictionFaction.restriction",
        r#"<Datasheet>
    <Data name="factions">
        <Child value="Horde"/>
    </Data>
</Datasheet>"#,
    );
    write_file(
        &dir,
        "Fireball.skill",
        r#"<Datasheet>
    <Data name="name" value="Fireball"/>
    <Data name="restriction" value="RestrictionFaction.restriction"/>
</Datasheet>"#,
    );
    let (mut manager, _types) = datasheet_manager(&dir);

    manager.load("Fireball.skill", None).unwrap();
    let fireball = manager.key_of("Fireball.skill").unwrap();
    let restriction = manager.key_of("RestrictionFaction.restriction").unwrap();
    assert!(
        manager
            .resource_dependencies("Fireball.skill")
            .unwrap()
            .contains(&restriction)
    );
    {
        let skill = manager.get_as::<Datasheet>("Fireball.skill").unwrap();
        let link = skill.root_as::<Skill>().unwrap().restriction.clone().unwrap();
        let target = link.resolve_as::<Restriction>(&manager).unwrap();
        assert_eq!(target.factions, vec!["Horde"]);
    }

    let recorder = EventRecorder::new();
    manager
        .register_listener("Fireball.skill", EDITOR, recorder.listener())
        .unwrap();
    manager
        .register_listener("RestrictionFaction.restriction", EDITOR, recorder.listener())
        .unwrap();

    manager.delete_resource("RestrictionFaction.restriction").unwrap();
    assert_eq!(
        recorder.events(),
        vec![
            ResourceEvent::of_dependency(
                fireball,
                ResourceEventKind::DependencyRemoved,
                restriction
            ),
            ResourceEvent::own(restriction, ResourceEventKind::ResourceRemoved),
        ]
    );

    assert!(!manager.has("RestrictionFaction.restriction"));
    assert!(!dir.join("RestrictionFaction.restriction").exists());
    assert!(
        !manager
            .resource_dependencies("Fireball.skill")
            .unwrap()
            .contains(&restriction)
    );
    assert!(manager.dependency_graph().is_consistent());

    // The skill keeps its link, but it no longer resolves.
    let skill = manager.get_as::<Datasheet>("Fireball.skill").unwrap();
    assert!(!skill.dependencies().contains(&restriction));
    let link = skill.root_as::<Skill>().unwrap().restriction.clone().unwrap();
    assert!(link.resolve(&manager).is_none());

    cleanup(&dir);
}

#[test]
fn removing_a_directory_notifies_every_referencer() {
    let dir = make_test_dir("it_remove_path");
    write_file(&dir, "shared/Core.stub", "");
    write_file(&dir, "shared/Extra.stub", "Core.stub");
    write_file(&dir, "Game.stub", "Core.stub\nExtra.stub");
    let mut manager = stub_manager(&dir);
    manager.preload_all();

    let recorder = EventRecorder::new();
    manager
        .register_listener("Game.stub", EDITOR, recorder.listener())
        .unwrap();

    let shared = dir.join("shared");
    let removed = manager.remove_resources_from_path(&shared.to_string_lossy());
    assert_eq!(removed, 2);
    assert_eq!(manager.len(), 1);

    let events = recorder.events();
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|event| event.kind == ResourceEventKind::DependencyRemoved));

    let game = manager.get_as::<StubResource>("Game.stub").unwrap();
    assert!(game.dependency_ids().is_empty());
    assert_eq!(game.removed().len(), 2);
    assert!(manager.dependency_graph().is_consistent());

    cleanup(&dir);
}
