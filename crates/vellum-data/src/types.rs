//! Datasheet object types and named enums.
//!
//! Every object type name doubles as a datasheet file extension: a file
//! named `Orc.unit` is a datasheet whose root object is a `unit`.
//! [`install`] turns the registered object types into resource factories on
//! a [`ResourceManager`].

use crate::datasheet::Datasheet;
use crate::error::DatasheetError;
use crate::object::DatasheetObject;
use log::{debug, error};
use std::collections::HashMap;
use std::rc::Rc;
use vellum_core::{Resource, ResourceKind, ResourceManager};

/// Builds an empty object of one type.
pub type ObjectConstructor = Box<dyn Fn() -> Box<dyn DatasheetObject>>;

// ---------------------------------------------------------------------------
// DatasheetEnum
// ---------------------------------------------------------------------------

/// An ordered list of symbols. A symbol's position is its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasheetEnum {
    values: Vec<String>,
}

impl DatasheetEnum {
    pub fn new<S: AsRef<str>>(values: &[S]) -> Self {
        Self {
            values: values.iter().map(|v| v.as_ref().to_string()).collect(),
        }
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.values.iter().position(|value| value == symbol)
    }

    pub fn symbol(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

// ---------------------------------------------------------------------------
// DatasheetTypes
// ---------------------------------------------------------------------------

/// Object constructors and enums, keyed by name.
///
/// Registration happens up front; the finished set is shared as
/// `Rc<DatasheetTypes>` by every datasheet it installs.
#[derive(Default)]
pub struct DatasheetTypes {
    objects: Vec<(String, ObjectConstructor)>,
    object_index: HashMap<String, usize>,
    enums: HashMap<String, DatasheetEnum>,
}

impl std::fmt::Debug for DatasheetTypes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let objects: Vec<&str> = self.object_types().collect();
        f.debug_struct("DatasheetTypes")
            .field("objects", &objects)
            .field("enums", &self.enums)
            .finish()
    }
}

impl DatasheetTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object type. A duplicate name is rejected and the first
    /// constructor kept.
    pub fn register_object(
        &mut self,
        name: &str,
        constructor: ObjectConstructor,
    ) -> Result<(), DatasheetError> {
        if self.object_index.contains_key(name) {
            let e = DatasheetError::DuplicateObjectType(name.to_string());
            error!("{e}");
            return Err(e);
        }
        self.object_index.insert(name.to_string(), self.objects.len());
        self.objects.push((name.to_string(), constructor));
        Ok(())
    }

    pub fn register_default<T: DatasheetObject + Default>(
        &mut self,
        name: &str,
    ) -> Result<(), DatasheetError> {
        self.register_object(
            name,
            Box::new(|| Box::new(T::default()) as Box<dyn DatasheetObject>),
        )
    }

    pub fn has_object_type(&self, name: &str) -> bool {
        self.object_index.contains_key(name)
    }

    /// Object type names in registration order.
    pub fn object_types(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|(name, _)| name.as_str())
    }

    pub fn instantiate(&self, name: &str) -> Result<Box<dyn DatasheetObject>, DatasheetError> {
        self.object_index
            .get(name)
            .and_then(|&index| self.objects.get(index))
            .map(|(_, constructor)| constructor())
            .ok_or_else(|| DatasheetError::UnknownObjectType(name.to_string()))
    }

    /// Register a named enum. A duplicate name is rejected and the first
    /// list kept.
    pub fn register_enum<S: AsRef<str>>(
        &mut self,
        name: &str,
        values: &[S],
    ) -> Result<(), DatasheetError> {
        if self.enums.contains_key(name) {
            let e = DatasheetError::DuplicateEnum(name.to_string());
            error!("{e}");
            return Err(e);
        }
        self.enums.insert(name.to_string(), DatasheetEnum::new(values));
        Ok(())
    }

    pub fn enum_values(&self, name: &str) -> Option<&DatasheetEnum> {
        self.enums.get(name)
    }
}

/// Register a datasheet factory on `manager` for every object type in
/// `types`. Types registered on a manager before keep their factory.
/// Returns how many factories were added.
pub fn install(manager: &mut ResourceManager, types: &Rc<DatasheetTypes>) -> usize {
    let mut installed = 0;
    for name in types.object_types() {
        let shared = Rc::clone(types);
        let type_name = name.to_string();
        let constructor = Box::new(move || {
            Box::new(Datasheet::new(Rc::clone(&shared), &type_name)) as Box<dyn Resource>
        });
        if manager.register_factory(ResourceKind::Custom(name.to_string()), constructor) {
            installed += 1;
        }
    }
    debug!("installed {installed} datasheet factories");
    installed
}
