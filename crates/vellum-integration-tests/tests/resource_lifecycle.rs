//! Registry lifecycle with datasheet payloads: configuration, scans, moves,
//! explicit adds and deletes.

use std::rc::Rc;
use vellum_core::test_utils::{cleanup, make_test_dir, write_file};
use vellum_core::{
    FileLocator, ResourceConfig, ResourceError, ResourceKind, ResourceManager,
};
use vellum_data::test_utils::{Faction, Unit, datasheet_manager, sample_types, unit_xml};
use vellum_data::{DataNode, Datasheet, DatasheetDocument, datasheet_object, install};

// ===========================================================================
// Configuration and scanning
// ===========================================================================

#[test_log::test]
fn init_from_a_config_file() {
    let dir = make_test_dir("it_init_config");
    let assets = dir.join("assets");
    write_file(&assets, "units/Orc.unit", &unit_xml(None, r#"<Data name="health" value="40"/>"#));
    write_file(&assets, "factions/Horde.faction", "<Datasheet/>");
    let config_path = write_file(
        &dir,
        "resources.ron",
        &format!(
            "(assets_root: \"{}\", use_full_paths: true)",
            assets.display()
        ),
    );

    let config = ResourceConfig::load(&config_path).unwrap();
    assert!(config.use_full_paths);
    assert!(config.track_dependencies);

    let mut manager = ResourceManager::init(config).unwrap();
    let types = Rc::new(sample_types());
    install(&mut manager, &types);

    assert_eq!(manager.len(), 2);
    assert!(manager.has("units/Orc.unit"));
    assert!(!manager.has("Orc.unit"));

    let orc = datasheet_object::<Unit>(&mut manager, "units/Orc.unit").unwrap();
    assert_eq!(orc.health, 40);

    let infos = manager.all_resource_infos();
    let ids: Vec<&str> = infos.iter().map(|info| info.id.as_str()).collect();
    assert_eq!(ids, vec!["factions/Horde.faction", "units/Orc.unit"]);

    let locator = manager.file_locator("factions/Horde.faction").unwrap().clone();
    assert_eq!(manager.resource_id(&locator), Some("factions/Horde.faction"));
    assert_eq!(
        manager.resource_type(&locator),
        Some(ResourceKind::Custom("faction".into()))
    );

    cleanup(&dir);
}

#[test]
fn preload_and_save_every_datasheet() {
    let dir = make_test_dir("it_preload_save");
    write_file(&dir, "Orc.unit", &unit_xml(None, r#"<Data name="health" value="40"/>"#));
    write_file(&dir, "Horde.faction", r#"<Datasheet><Data name="name" value="Horde"/></Datasheet>"#);
    write_file(&dir, "notes.txt", "not a resource");
    let (mut manager, _types) = datasheet_manager(&dir);

    assert_eq!(manager.preload_all(), 2);
    assert!(!manager.is_loaded("notes.txt"));
    assert!(matches!(
        manager.load("notes.txt", None),
        Err(ResourceError::UnresolvedType { .. })
    ));

    assert_eq!(manager.save_all(), 2);
    let saved = DatasheetDocument::load_file(&dir.join("Horde.faction")).unwrap();
    let name = saved.root().find_data("name").unwrap();
    assert_eq!(name.attribute("value"), Some("Horde"));

    cleanup(&dir);
}

// ===========================================================================
// Editing operations
// ===========================================================================

#[test]
fn moving_a_datasheet_rekeys_and_relocates() {
    let dir = make_test_dir("it_move");
    write_file(&dir, "Orc.unit", &unit_xml(None, r#"<Data name="health" value="40"/>"#));
    write_file(&dir, "Warband.unit", &unit_xml(Some("Orc.unit"), ""));
    write_file(&dir, "Goblin.unit", "<Datasheet/>");
    let (mut manager, _types) = datasheet_manager(&dir);
    manager.preload_all();

    let collision = manager
        .move_resource("Orc.unit", FileLocator::in_directory(&dir, "Goblin.unit"))
        .unwrap_err();
    assert!(matches!(collision, ResourceError::MoveTargetCollision { .. }));
    assert!(dir.join("Orc.unit").exists());

    let key = manager.key_of("Orc.unit").unwrap();
    let moved = manager
        .move_resource("Orc.unit", FileLocator::in_directory(dir.join("archive"), "OldOrc.unit"))
        .unwrap_err();
    // The archive directory does not exist, so the save fails and nothing moves.
    assert!(matches!(moved, ResourceError::Save { .. }));
    assert!(manager.has("Orc.unit"));

    std::fs::create_dir_all(dir.join("archive")).unwrap();
    let moved = manager
        .move_resource("Orc.unit", FileLocator::in_directory(dir.join("archive"), "OldOrc.unit"))
        .unwrap();
    assert_eq!(moved, key);
    assert!(!manager.has("Orc.unit"));
    assert!(manager.has("OldOrc.unit"));
    assert!(!dir.join("Orc.unit").exists());
    assert!(dir.join("archive/OldOrc.unit").exists());

    // The referencing datasheet still points at the same record.
    let warband = manager.key_of("Warband.unit").unwrap();
    assert!(manager.dependency_graph().referencers(key).unwrap().contains(&warband));

    cleanup(&dir);
}

#[test]
fn explicit_adds_do_not_overwrite() {
    let dir = make_test_dir("it_add");
    write_file(&dir, "Horde.faction", "<Datasheet/>");
    let (mut manager, types) = datasheet_manager(&dir);

    let mut document = DatasheetDocument::new();
    document
        .root_mut()
        .push_child(DataNode::data("name").with_value("Alliance"));
    let sheet = Datasheet::from_document(Rc::clone(&types), "faction", document);
    let locator = FileLocator::in_directory(&dir, "Alliance.faction");
    let key = manager.add_resource(Box::new(sheet), locator.clone()).unwrap();
    assert!(manager.is_loaded("Alliance.faction"));
    assert_eq!(manager.key_of("Alliance.faction"), Some(key));
    assert_eq!(manager.save_all(), 1);
    assert!(locator.exists());

    let duplicate = Datasheet::new(Rc::clone(&types), "faction");
    let err = manager
        .add_resource(Box::new(duplicate), FileLocator::in_directory(&dir, "Horde.faction"))
        .unwrap_err();
    assert!(matches!(err, ResourceError::DuplicateId { id, .. } if id == "Horde.faction"));

    // A fresh manager reads the added document back from disk.
    let (mut reloaded, _types) = datasheet_manager(&dir);
    let alliance = datasheet_object::<Faction>(&mut reloaded, "Alliance.faction").unwrap();
    assert_eq!(alliance.name, "Alliance");

    cleanup(&dir);
}

#[test]
fn soft_remove_hands_the_payload_back() {
    let dir = make_test_dir("it_soft_remove");
    write_file(&dir, "Orc.unit", &unit_xml(None, r#"<Data name="health" value="40"/>"#));
    let (mut manager, _types) = datasheet_manager(&dir);
    manager.load("Orc.unit", None).unwrap();

    let payload = manager.remove_resource("Orc.unit", false).unwrap().unwrap();
    assert!(!manager.has("Orc.unit"));
    assert!(dir.join("Orc.unit").exists());
    let sheet = payload.downcast_ref::<Datasheet>().unwrap();
    assert_eq!(sheet.root_as::<Unit>().unwrap().health, 40);

    assert!(matches!(
        manager.delete_resource("Orc.unit"),
        Err(ResourceError::UnknownId(_))
    ));

    cleanup(&dir);
}

#[test]
fn tracking_can_be_disabled() {
    let dir = make_test_dir("it_untracked");
    write_file(&dir, "Base.unit", &unit_xml(None, r#"<Data name="health" value="3"/>"#));
    write_file(&dir, "Child.unit", &unit_xml(Some("Base.unit"), ""));

    let config = ResourceConfig {
        track_dependencies: false,
        ..ResourceConfig::with_root(&dir)
    };
    let mut manager = ResourceManager::new(config);
    install(&mut manager, &Rc::new(sample_types()));
    manager.parse_directory(&dir).unwrap();
    assert_eq!(manager.preload_all(), 2);

    assert!(manager.dependency_graph().is_empty());
    assert!(manager.resource_dependencies("Child.unit").is_none());
    let child = datasheet_object::<Unit>(&mut manager, "Child.unit").unwrap();
    assert_eq!(child.health, 3);

    cleanup(&dir);
}
