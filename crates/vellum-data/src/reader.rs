//! Typed member reads over one datasheet node.
//!
//! A [`DataReader`] is handed to [`DatasheetObject::parse_members`] once per
//! document in the ancestor chain. No read fails: a missing member leaves
//! the output untouched, and an unreadable scalar is logged and leaves it
//! untouched as well. That is what lets a derived document overlay only the
//! members it declares.
//!
//! | Read                     | Member present                         | Member absent |
//! |--------------------------|----------------------------------------|---------------|
//! | `read`                   | assign the parsed `value`              | unchanged     |
//! | `read_array`             | replace with the `<Child>` values      | unchanged     |
//! | `read_instance`          | fresh instance, `None` for `type=""`   | unchanged     |
//! | `read_reference`         | link to the named datasheet            | unchanged     |
//! | `read_enum`              | index of the symbol, if known          | unchanged     |

use crate::document::{ATTR_TYPE, ATTR_VALUE, CHILD_TAG, DataNode};
use crate::object::{DatasheetObject, DatasheetRef};
use crate::types::DatasheetTypes;
use log::warn;
use std::collections::BTreeSet;
use vellum_core::{LoadContext, ResourceKey, ResourceKind};

// ---------------------------------------------------------------------------
// Value conversions
// ---------------------------------------------------------------------------

/// A scalar that can be read from a `value` attribute.
pub trait DataValue: Sized {
    fn parse_value(value: &str) -> Option<Self>;
}

impl DataValue for String {
    fn parse_value(value: &str) -> Option<Self> {
        Some(value.to_string())
    }
}

/// Truthy when the value starts with `1`, `t`, `T`, `y` or `Y`.
/// An empty value is unreadable.
impl DataValue for bool {
    fn parse_value(value: &str) -> Option<Self> {
        let first = value.chars().next()?;
        Some(matches!(first, '1' | 't' | 'T' | 'y' | 'Y'))
    }
}

macro_rules! impl_data_value_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl DataValue for $ty {
                fn parse_value(value: &str) -> Option<Self> {
                    value.trim().parse().ok()
                }
            }
        )*
    };
}

impl_data_value_from_str!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// A type that enum symbols convert into, by position in the enum.
pub trait DatasheetEnumValue: Sized {
    fn from_index(index: usize) -> Option<Self>;
}

impl DatasheetEnumValue for usize {
    fn from_index(index: usize) -> Option<Self> {
        Some(index)
    }
}

impl DatasheetEnumValue for u8 {
    fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index).ok()
    }
}

impl DatasheetEnumValue for i32 {
    fn from_index(index: usize) -> Option<Self> {
        i32::try_from(index).ok()
    }
}

// ---------------------------------------------------------------------------
// DataReader
// ---------------------------------------------------------------------------

pub struct DataReader<'r, 'm> {
    ctx: &'r mut LoadContext<'m>,
    types: &'r DatasheetTypes,
    node: &'r DataNode,
    dependencies: &'r mut BTreeSet<ResourceKey>,
}

impl<'r, 'm> DataReader<'r, 'm> {
    /// A reader over `node`. Resolved references are added to
    /// `dependencies`.
    pub fn new(
        ctx: &'r mut LoadContext<'m>,
        types: &'r DatasheetTypes,
        node: &'r DataNode,
        dependencies: &'r mut BTreeSet<ResourceKey>,
    ) -> Self {
        Self {
            ctx,
            types,
            node,
            dependencies,
        }
    }

    pub fn node(&self) -> &DataNode {
        self.node
    }

    pub fn types(&self) -> &DatasheetTypes {
        self.types
    }

    /// The id of the datasheet being loaded.
    pub fn owner_id(&self) -> &str {
        self.ctx
            .resource_id(self.ctx.key())
            .unwrap_or("<unregistered>")
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.node.find_data(name).is_some()
    }

    // -- Scalars --

    pub fn read<T: DataValue>(&self, name: &str, out: &mut T) {
        let Some(value) = self
            .node
            .find_data(name)
            .and_then(|member| member.attribute(ATTR_VALUE))
        else {
            return;
        };
        match T::parse_value(value) {
            Some(parsed) => *out = parsed,
            None => warn!(
                "{}: member '{name}' has an unreadable value '{value}'",
                self.owner_id()
            ),
        }
    }

    /// Replace `out` with the values of the member's children.
    ///
    /// Every `<Child>` yields one element: one without a readable `value`
    /// becomes `T::default()`, so positions line up with the document.
    pub fn read_array<T: DataValue + Default>(&self, name: &str, out: &mut Vec<T>) {
        let Some(member) = self.node.find_data(name) else {
            return;
        };
        out.clear();
        for child in member.children_tagged(CHILD_TAG) {
            let value = child.attribute(ATTR_VALUE).unwrap_or_default();
            match T::parse_value(value) {
                Some(parsed) => out.push(parsed),
                None => {
                    warn!(
                        "{}: array '{name}' has an unreadable value '{value}'",
                        self.owner_id()
                    );
                    out.push(T::default());
                }
            }
        }
    }

    // -- Instances --

    /// Build a fresh object from the member's sub-node.
    ///
    /// The object type is the member's `type` attribute, or `default_type`
    /// when it has none. An explicitly empty type sets `out` to `None`.
    pub fn read_instance(
        &mut self,
        name: &str,
        default_type: &str,
        out: &mut Option<Box<dyn DatasheetObject>>,
    ) {
        let node = self.node;
        let Some(member) = node.find_data(name) else {
            return;
        };
        let type_name = member.attribute(ATTR_TYPE).unwrap_or(default_type);
        *out = if type_name.is_empty() {
            None
        } else {
            self.parse_object(member, type_name)
        };
    }

    /// Rebuild `out` from the member's children, each with its own optional
    /// type. Children with an empty type become `None`; children that cannot
    /// be instantiated are skipped.
    pub fn read_instance_array(
        &mut self,
        name: &str,
        default_type: &str,
        out: &mut Vec<Option<Box<dyn DatasheetObject>>>,
    ) {
        let node = self.node;
        let Some(member) = node.find_data(name) else {
            return;
        };
        out.clear();
        for child in member.children_tagged(CHILD_TAG) {
            let type_name = child.attribute(ATTR_TYPE).unwrap_or(default_type);
            if type_name.is_empty() {
                out.push(None);
            } else if let Some(object) = self.parse_object(child, type_name) {
                out.push(Some(object));
            }
        }
    }

    fn parse_object(&mut self, node: &DataNode, type_name: &str) -> Option<Box<dyn DatasheetObject>> {
        let mut object = match self.types.instantiate(type_name) {
            Ok(object) => object,
            Err(e) => {
                warn!("{}: {e}", self.owner_id());
                return None;
            }
        };
        let mut sub = DataReader {
            ctx: &mut *self.ctx,
            types: self.types,
            node,
            dependencies: &mut *self.dependencies,
        };
        object.parse_members(&mut sub);
        Some(object)
    }

    // -- References --

    /// Link `out` to the datasheet named by the member's value, loading it
    /// if needed. An empty or absent value clears the link.
    pub fn read_reference(&mut self, name: &str, out: &mut Option<DatasheetRef>) {
        let node = self.node;
        let Some(member) = node.find_data(name) else {
            return;
        };
        *out = match member.attribute(ATTR_VALUE) {
            Some(id) if !id.is_empty() => self.resolve_reference(id),
            _ => None,
        };
    }

    pub fn read_reference_array(&mut self, name: &str, out: &mut Vec<Option<DatasheetRef>>) {
        let node = self.node;
        let Some(member) = node.find_data(name) else {
            return;
        };
        out.clear();
        for id in member
            .children_tagged(CHILD_TAG)
            .filter_map(|child| child.attribute(ATTR_VALUE))
        {
            let reference = if id.is_empty() {
                None
            } else {
                self.resolve_reference(id)
            };
            out.push(reference);
        }
    }

    fn resolve_reference(&mut self, id: &str) -> Option<DatasheetRef> {
        let Some(key) = self.ctx.load(id) else {
            warn!("{}: cannot resolve datasheet reference '{id}'", self.owner_id());
            return None;
        };
        let is_datasheet = match self.ctx.kind_of(key) {
            Some(ResourceKind::Custom(name)) => self.types.has_object_type(&name),
            _ => false,
        };
        if !is_datasheet {
            warn!("{}: reference '{id}' is not a datasheet", self.owner_id());
            return None;
        }
        self.dependencies.insert(key);
        Some(DatasheetRef::new(key, id))
    }

    // -- Enums --

    /// Assign the position of the member's symbol in `enum_name`. Unknown
    /// symbols leave `out` unchanged.
    pub fn read_enum<T: DatasheetEnumValue>(&self, name: &str, enum_name: &str, out: &mut T) {
        let Some(symbol) = self
            .node
            .find_data(name)
            .and_then(|member| member.attribute(ATTR_VALUE))
        else {
            return;
        };
        let Some(values) = self.types.enum_values(enum_name) else {
            warn!("{}: unknown enum '{enum_name}'", self.owner_id());
            return;
        };
        match values.index_of(symbol).and_then(T::from_index) {
            Some(value) => *out = value,
            None => warn!(
                "{}: '{symbol}' is not a value of enum '{enum_name}'",
                self.owner_id()
            ),
        }
    }

    pub fn read_enum_array<T: DatasheetEnumValue>(
        &self,
        name: &str,
        enum_name: &str,
        out: &mut Vec<T>,
    ) {
        let Some(values) = self.types.enum_values(enum_name) else {
            warn!("{}: unknown enum '{enum_name}'", self.owner_id());
            return;
        };
        let Some(member) = self.node.find_data(name) else {
            return;
        };
        out.clear();
        out.extend(
            member
                .children_tagged(CHILD_TAG)
                .filter_map(|child| child.attribute(ATTR_VALUE))
                .filter_map(|symbol| values.index_of(symbol))
                .filter_map(T::from_index),
        );
    }
}
