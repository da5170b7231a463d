//! The datasheet resource kind.
//!
//! A [`Datasheet`] owns its local document and the single root object built
//! from it and its ancestors. Its declared dependencies are every ancestor
//! in its parent chain plus every datasheet its members reference.

use crate::document::DatasheetDocument;
use crate::inheritance::{AncestorStack, resolve_chain};
use crate::object::DatasheetObject;
use crate::types::DatasheetTypes;
use log::debug;
use std::any::Any;
use std::collections::BTreeSet;
use std::rc::Rc;
use vellum_core::{
    FileLocator, LoadContext, Resource, ResourceError, ResourceInfo, ResourceKey, ResourceKind,
    ResourceManager,
};

pub struct Datasheet {
    types: Rc<DatasheetTypes>,
    type_name: String,
    info: Option<ResourceInfo>,
    document: DatasheetDocument,
    root: Option<Box<dyn DatasheetObject>>,
    dependencies: BTreeSet<ResourceKey>,
    parent: Option<ResourceKey>,
    cycles: Vec<Vec<String>>,
}

impl std::fmt::Debug for Datasheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datasheet")
            .field("type_name", &self.type_name)
            .field("id", &self.info.as_ref().map(|info| info.id.as_str()))
            .field("root", &self.root)
            .field("parent", &self.parent)
            .finish()
    }
}

impl Datasheet {
    pub fn new(types: Rc<DatasheetTypes>, type_name: &str) -> Self {
        Self {
            types,
            type_name: type_name.to_string(),
            info: None,
            document: DatasheetDocument::new(),
            root: None,
            dependencies: BTreeSet::new(),
            parent: None,
            cycles: Vec::new(),
        }
    }

    /// A datasheet built in code around an existing document, ready to be
    /// handed to [`ResourceManager::add_resource`].
    pub fn from_document(
        types: Rc<DatasheetTypes>,
        type_name: &str,
        document: DatasheetDocument,
    ) -> Self {
        let mut datasheet = Self::new(types, type_name);
        datasheet.document = document;
        datasheet
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn document(&self) -> &DatasheetDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut DatasheetDocument {
        &mut self.document
    }

    pub fn root_object(&self) -> Option<&dyn DatasheetObject> {
        self.root.as_deref()
    }

    pub fn root_as<T: DatasheetObject>(&self) -> Option<&T> {
        self.root_object()?.downcast_ref::<T>()
    }

    /// The key of the direct parent, while it is registered.
    pub fn parent_key(&self) -> Option<ResourceKey> {
        self.parent
    }

    /// Point the document at a new parent id. Takes effect on the next load.
    pub fn set_parent(&mut self, parent: Option<&str>) {
        self.document.set_parent(parent);
    }

    /// Ancestor cycles met while loading, each as the path that closed it.
    pub fn inheritance_cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    fn id(&self, locator: &FileLocator) -> String {
        self.info
            .as_ref()
            .map_or_else(|| locator.file_name().to_string(), |info| info.id.clone())
    }
}

impl Resource for Datasheet {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Custom(self.type_name.clone())
    }

    fn init(&mut self, info: &ResourceInfo) {
        self.info = Some(info.clone());
    }

    fn load_from_file(
        &mut self,
        ctx: &mut LoadContext<'_>,
        locator: &FileLocator,
    ) -> Result<(), ResourceError> {
        let id = self.id(locator);
        let document = DatasheetDocument::load_file(&locator.path())
            .map_err(|e| e.into_load_error(&id))?;
        let mut root = self
            .types
            .instantiate(&self.type_name)
            .map_err(|e| e.into_load_error(&id))?;

        let mut dependencies = BTreeSet::new();
        let mut ancestors = AncestorStack::new(ctx.key(), &id);
        let parent = resolve_chain(
            ctx,
            &self.types,
            &self.type_name,
            &document,
            &mut ancestors,
            &mut *root,
            &mut dependencies,
        );

        debug!("'{id}' parsed with {} dependencies", dependencies.len());
        self.document = document;
        self.root = Some(root);
        self.dependencies = dependencies;
        self.parent = parent;
        self.cycles = ancestors.into_cycles();
        Ok(())
    }

    fn save_to_file(&self, locator: &FileLocator) -> Result<(), ResourceError> {
        self.document
            .save_file(&locator.path())
            .map_err(|e| e.into_save_error(&self.id(locator)))
    }

    fn dependencies(&self) -> BTreeSet<ResourceKey> {
        self.dependencies.clone()
    }

    fn on_dependency_removed(&mut self, dependency: ResourceKey) {
        self.dependencies.remove(&dependency);
        if self.parent == Some(dependency) {
            self.parent = None;
            self.document.set_parent(None);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Load the datasheet `id` and return its root object as `T`.
pub fn datasheet_object<'m, T: DatasheetObject>(
    manager: &'m mut ResourceManager,
    id: &str,
) -> Option<&'m T> {
    manager.get_as::<Datasheet>(id)?.root_as::<T>()
}
