//! Sample datasheet objects and manager helpers for tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::object::{DatasheetObject, DatasheetRef};
use crate::reader::DataReader;
use crate::types::{DatasheetTypes, install};
use std::any::Any;
use std::path::Path;
use std::rc::Rc;
use vellum_core::{ResourceConfig, ResourceManager};

pub const RANK_ENUM: &str = "rank";
pub const RANKS: [&str; 3] = ["recruit", "veteran", "elite"];

// ===========================================================================
// Sample objects
// ===========================================================================

/// Exercises every kind of member read.
#[derive(Debug, Default)]
pub struct Unit {
    pub name: String,
    pub health: i32,
    pub speed: f32,
    pub elite: bool,
    pub tags: Vec<String>,
    pub stats: Vec<i32>,
    pub weapon: Option<Box<dyn DatasheetObject>>,
    pub loadout: Vec<Option<Box<dyn DatasheetObject>>>,
    pub faction: Option<DatasheetRef>,
    pub allies: Vec<Option<DatasheetRef>>,
    pub rank: usize,
    pub ranks: Vec<usize>,
}

impl DatasheetObject for Unit {
    fn parse_members(&mut self, reader: &mut DataReader<'_, '_>) {
        reader.read("name", &mut self.name);
        reader.read("health", &mut self.health);
        reader.read("speed", &mut self.speed);
        reader.read("elite", &mut self.elite);
        reader.read_array("tags", &mut self.tags);
        reader.read_array("stats", &mut self.stats);
        reader.read_instance("weapon", "weapon", &mut self.weapon);
        reader.read_instance_array("loadout", "weapon", &mut self.loadout);
        reader.read_reference("faction", &mut self.faction);
        reader.read_reference_array("allies", &mut self.allies);
        reader.read_enum("rank", RANK_ENUM, &mut self.rank);
        reader.read_enum_array("ranks", RANK_ENUM, &mut self.ranks);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct Weapon {
    pub damage: i32,
}

impl DatasheetObject for Weapon {
    fn parse_members(&mut self, reader: &mut DataReader<'_, '_>) {
        reader.read("damage", &mut self.damage);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct Bow {
    pub damage: i32,
    pub range: f32,
}

impl DatasheetObject for Bow {
    fn parse_members(&mut self, reader: &mut DataReader<'_, '_>) {
        reader.read("damage", &mut self.damage);
        reader.read("range", &mut self.range);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct Faction {
    pub name: String,
}

impl DatasheetObject for Faction {
    fn parse_members(&mut self, reader: &mut DataReader<'_, '_>) {
        reader.read("name", &mut self.name);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A skill gated behind a restriction datasheet.
#[derive(Debug, Default)]
pub struct Skill {
    pub name: String,
    pub restriction: Option<DatasheetRef>,
}

impl DatasheetObject for Skill {
    fn parse_members(&mut self, reader: &mut DataReader<'_, '_>) {
        reader.read("name", &mut self.name);
        reader.read_reference("restriction", &mut self.restriction);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct Restriction {
    pub factions: Vec<String>,
}

impl DatasheetObject for Restriction {
    fn parse_members(&mut self, reader: &mut DataReader<'_, '_>) {
        reader.read_array("factions", &mut self.factions);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ===========================================================================
// Registries and managers
// ===========================================================================

/// Every sample object type plus the `rank` enum.
///
/// `axe` is a second name for [`Weapon`] so documents can override an
/// instance's type.
pub fn sample_types() -> DatasheetTypes {
    let mut types = DatasheetTypes::new();
    types.register_default::<Unit>("unit").expect("unit");
    types.register_default::<Weapon>("weapon").expect("weapon");
    types.register_default::<Weapon>("axe").expect("axe");
    types.register_default::<Bow>("bow").expect("bow");
    types.register_default::<Faction>("faction").expect("faction");
    types.register_default::<Skill>("skill").expect("skill");
    types
        .register_default::<Restriction>("restriction")
        .expect("restriction");
    types.register_enum(RANK_ENUM, &RANKS).expect("rank enum");
    types
}

/// A manager rooted at `dir` with the sample datasheet types installed and
/// every file under `dir` registered.
pub fn datasheet_manager(dir: &Path) -> (ResourceManager, Rc<DatasheetTypes>) {
    let types = Rc::new(sample_types());
    let mut manager = ResourceManager::new(ResourceConfig::with_root(dir));
    install(&mut manager, &types);
    manager
        .parse_directory(dir)
        .expect("failed to scan test dir");
    (manager, types)
}

/// A `<Datasheet>` document with an optional parent around `body`.
pub fn unit_xml(parent: Option<&str>, body: &str) -> String {
    let parent = parent.map_or_else(String::new, |parent| format!(" parent=\"{parent}\""));
    format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Datasheet{parent}>\n{body}\n</Datasheet>\n")
}
