//! The capability contract every resource kind implements.
//!
//! The manager owns resources as `Box<dyn Resource>` and drives them through
//! [`Resource::init`], [`Resource::load_from_file`] and, for savable kinds,
//! [`Resource::save_to_file`]. Dependencies are reported as a set of
//! [`ResourceKey`]s and captured into the dependency graph after every load.

use crate::error::ResourceError;
use crate::id::ResourceKey;
use crate::kind::ResourceKind;
use crate::loader::LoadContext;
use crate::locator::FileLocator;
use std::any::Any;
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// ResourceInfo
// ---------------------------------------------------------------------------

/// The identity of the record a resource is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    pub key: ResourceKey,
    pub id: String,
    pub locator: FileLocator,
}

// ---------------------------------------------------------------------------
// Resource trait
// ---------------------------------------------------------------------------

pub trait Resource: Any {
    fn kind(&self) -> ResourceKind;

    /// Bind the resource to its record. Called before the first load and
    /// again after the record moves.
    fn init(&mut self, info: &ResourceInfo) {
        let _ = info;
    }

    /// Parse the backing file. Nested loads go through `ctx`.
    fn load_from_file(
        &mut self,
        ctx: &mut LoadContext<'_>,
        locator: &FileLocator,
    ) -> Result<(), ResourceError>;

    fn save_to_file(&self, locator: &FileLocator) -> Result<(), ResourceError> {
        let _ = locator;
        Err(ResourceError::Unsupported {
            operation: "save",
            kind: self.kind(),
        })
    }

    /// The resources this one currently reads from.
    fn dependencies(&self) -> BTreeSet<ResourceKey> {
        BTreeSet::new()
    }

    /// A dependency changed. Called before any listener observes the change.
    fn on_dependency_updated(&mut self, dependency: ResourceKey) {
        let _ = dependency;
    }

    /// A dependency is being removed. The resource should drop every handle
    /// it holds to it.
    fn on_dependency_removed(&mut self, dependency: ResourceKey) {
        let _ = dependency;
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Resource {
    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Resource>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl std::fmt::Debug for dyn Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Resource({})", self.kind())
    }
}
