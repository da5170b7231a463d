//! The objects datasheets produce, and references between them.

use crate::datasheet::Datasheet;
use crate::reader::DataReader;
use std::any::Any;
use std::fmt::Debug;
use vellum_core::{ResourceKey, ResourceManager};

/// A typed object populated from datasheet members.
///
/// `parse_members` runs once per document in the ancestor chain, base
/// first, on the same instance. Reads that find no member leave the field
/// alone, which is what makes inherited values stick.
pub trait DatasheetObject: Any + Debug {
    fn parse_members(&mut self, reader: &mut DataReader<'_, '_>);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn DatasheetObject {
    pub fn downcast_ref<T: DatasheetObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: DatasheetObject>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

// ---------------------------------------------------------------------------
// DatasheetRef
// ---------------------------------------------------------------------------

/// A non-owning link to another datasheet's root object.
///
/// The target stays owned by its own resource record. Resolving a reference
/// whose target has been removed yields `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasheetRef {
    key: ResourceKey,
    id: String,
}

impl DatasheetRef {
    pub fn new(key: ResourceKey, id: impl Into<String>) -> Self {
        Self { key, id: id.into() }
    }

    pub fn key(&self) -> ResourceKey {
        self.key
    }

    /// The id the reference was authored with.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn resolve<'m>(&self, manager: &'m ResourceManager) -> Option<&'m dyn DatasheetObject> {
        manager
            .resource(self.key)?
            .downcast_ref::<Datasheet>()?
            .root_object()
    }

    pub fn resolve_as<'m, T: DatasheetObject>(&self, manager: &'m ResourceManager) -> Option<&'m T> {
        self.resolve(manager)?.downcast_ref::<T>()
    }
}
