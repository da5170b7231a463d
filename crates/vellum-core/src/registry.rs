//! The resource manager: id→record mapping and resource lifecycle.
//!
//! Records live in a `SlotMap` arena and are indexed by id. A record is
//! "registered" once it has an id and a file locator, and "loaded" once a
//! payload is attached. Loading is lazy (see [`crate::loader`]); the
//! lifecycle operations here keep the registry, the payloads and the
//! [`DependencyGraph`] in step:
//!
//! - [`ResourceManager::add_resource`] registers an already built payload.
//! - [`ResourceManager::move_resource`] saves under the new path, then
//!   re-keys the record and deletes the old file.
//! - [`ResourceManager::remove_resource`] notifies referencers and severs
//!   graph edges before the record disappears.
//! - [`ResourceManager::delete_resource`] removes, then deletes the file.

use crate::config::ResourceConfig;
use crate::dependency::{DependencyGraph, DependencyHost};
use crate::error::{DependencyError, ResourceError};
use crate::event::ResourceListener;
use crate::id::{ListenerHandle, ResourceKey};
use crate::kind::ResourceKind;
use crate::loader::{ResourceConstructor, ResourceFactories};
use crate::locator::FileLocator;
use crate::resource::{Resource, ResourceInfo};
use log::{debug, error, info, warn};
use slotmap::SlotMap;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

// ---------------------------------------------------------------------------
// ResourceRecord
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ResourceRecord {
    pub(crate) id: String,
    pub(crate) locator: FileLocator,
    pub(crate) kind: Option<ResourceKind>,
    pub(crate) payload: Option<Box<dyn Resource>>,
    pub(crate) loading: bool,
}

impl ResourceRecord {
    fn new(id: String, locator: FileLocator) -> Self {
        Self {
            id,
            locator,
            kind: None,
            payload: None,
            loading: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn locator(&self) -> &FileLocator {
        &self.locator
    }

    /// The resolved kind. `None` until the first successful load.
    pub fn kind(&self) -> Option<&ResourceKind> {
        self.kind.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.payload.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn payload(&self) -> Option<&dyn Resource> {
        self.payload.as_deref()
    }
}

impl DependencyHost for SlotMap<ResourceKey, ResourceRecord> {
    fn declared_dependencies(&self, key: ResourceKey) -> Option<BTreeSet<ResourceKey>> {
        self.get(key)?.payload.as_ref().map(|payload| payload.dependencies())
    }

    fn on_dependency_updated(&mut self, referencer: ResourceKey, dependency: ResourceKey) {
        if let Some(payload) = self.get_mut(referencer).and_then(|r| r.payload.as_mut()) {
            payload.on_dependency_updated(dependency);
        }
    }

    fn on_dependency_removed(&mut self, referencer: ResourceKey, dependency: ResourceKey) {
        if let Some(payload) = self.get_mut(referencer).and_then(|r| r.payload.as_mut()) {
            payload.on_dependency_removed(dependency);
        }
    }
}

// ---------------------------------------------------------------------------
// ResourceManager
// ---------------------------------------------------------------------------

/// Owns every resource record, the factories that build payloads and the
/// dependency graph linking loaded payloads.
///
/// Single-threaded: all mutation goes through `&mut self`.
#[derive(Debug)]
pub struct ResourceManager {
    pub(crate) config: ResourceConfig,
    pub(crate) records: SlotMap<ResourceKey, ResourceRecord>,
    pub(crate) ids: BTreeMap<String, ResourceKey>,
    pub(crate) factories: ResourceFactories,
    pub(crate) graph: DependencyGraph,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new(ResourceConfig::default())
    }
}

impl ResourceManager {
    pub fn new(config: ResourceConfig) -> Self {
        Self {
            config,
            records: SlotMap::with_key(),
            ids: BTreeMap::new(),
            factories: ResourceFactories::new(),
            graph: DependencyGraph::new(),
        }
    }

    /// Build a manager and register everything under the assets root. A
    /// missing root yields an empty manager.
    pub fn init(config: ResourceConfig) -> Result<Self, ResourceError> {
        let root = config.assets_root.clone();
        let mut manager = Self::new(config);
        if root.is_dir() {
            manager.parse_directory(&root)?;
        } else {
            warn!("assets root {} does not exist", root.display());
        }
        Ok(manager)
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    pub fn factories(&self) -> &ResourceFactories {
        &self.factories
    }

    /// Register a constructor. Returns `false` if one is already registered
    /// for `kind`.
    pub fn register_factory(&mut self, kind: ResourceKind, constructor: ResourceConstructor) -> bool {
        self.factories.register(kind, constructor)
    }

    // -- Registration --

    /// The id `locator` receives under the current id policy.
    pub fn resource_id_for(&self, locator: &FileLocator) -> Option<String> {
        let id = if self.config.use_full_paths {
            locator
                .relative_to(&self.config.assets_root)
                .unwrap_or(locator.path_name())
        } else {
            locator.file_name()
        };
        (!id.is_empty()).then(|| id.to_string())
    }

    /// Register every file under `root`, recursively. Returns the number of
    /// new records; duplicates are logged and skipped.
    pub fn parse_directory(&mut self, root: impl AsRef<Path>) -> Result<usize, ResourceError> {
        let root = root.as_ref();
        let mut files = Vec::new();
        collect_files(root, &mut files)?;
        files.sort();

        let mut registered = 0;
        for path in files {
            let locator = FileLocator::new(&path);
            let Some(id) = self.resource_id_for(&locator) else {
                continue;
            };
            if self.register(&id, locator).is_ok() {
                registered += 1;
            }
        }
        info!("registered {registered} resources from {}", root.display());
        Ok(registered)
    }

    /// Register an unloaded record. Fails if `id` is taken; the first
    /// registration is kept.
    pub fn register(&mut self, id: &str, locator: FileLocator) -> Result<ResourceKey, ResourceError> {
        if let Some(&existing) = self.ids.get(id) {
            let registered_path = self
                .records
                .get(existing)
                .map(|record| record.locator.to_string())
                .unwrap_or_default();
            error!("resource id '{id}' is already registered (path: {registered_path}), ignoring {locator}");
            return Err(ResourceError::DuplicateId {
                id: id.to_string(),
                registered_path,
            });
        }
        let key = self.records.insert(ResourceRecord::new(id.to_string(), locator));
        self.ids.insert(id.to_string(), key);
        debug!("registered '{id}'");
        Ok(key)
    }

    // -- Queries --

    pub fn has(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.key_of(id)
            .and_then(|key| self.records.get(key))
            .is_some_and(|record| record.is_loaded())
    }

    pub fn file_locator(&self, id: &str) -> Option<&FileLocator> {
        self.record(self.key_of(id)?).map(|record| &record.locator)
    }

    pub fn key_of(&self, id: &str) -> Option<ResourceKey> {
        self.ids.get(id).copied()
    }

    pub fn id_of(&self, key: ResourceKey) -> Option<&str> {
        self.records.get(key).map(|record| record.id.as_str())
    }

    pub fn record(&self, key: ResourceKey) -> Option<&ResourceRecord> {
        self.records.get(key)
    }

    pub fn records(&self) -> impl Iterator<Item = (ResourceKey, &ResourceRecord)> {
        self.records.iter()
    }

    /// The loaded payload behind `key`, without loading it.
    pub fn resource(&self, key: ResourceKey) -> Option<&dyn Resource> {
        self.records.get(key)?.payload.as_deref()
    }

    /// Mutable access for editors. Call [`update_resource`](Self::update_resource)
    /// afterwards so referencers and listeners hear about the change.
    pub fn resource_mut(&mut self, key: ResourceKey) -> Option<&mut dyn Resource> {
        self.records.get_mut(key)?.payload.as_deref_mut()
    }

    /// Reverse lookup of the id registered for `locator`.
    pub fn resource_id(&self, locator: &FileLocator) -> Option<&str> {
        self.records
            .values()
            .find(|record| &record.locator == locator)
            .map(|record| record.id.as_str())
    }

    /// Every record, ordered by id.
    pub fn all_resource_infos(&self) -> Vec<ResourceInfo> {
        self.infos_where(|_| true)
    }

    /// Loaded records, ordered by id, optionally only those of `kind`.
    pub fn loaded_resource_infos(&self, kind: Option<&ResourceKind>) -> Vec<ResourceInfo> {
        self.infos_where(|record| {
            record.is_loaded() && kind.is_none_or(|kind| record.kind.as_ref() == Some(kind))
        })
    }

    /// Records whose file lives under `directory`, ordered by id. With a
    /// `kind` filter, records are matched by the kind their extension
    /// resolves to, so unloaded files are listed too.
    pub fn resource_infos_from_path(
        &self,
        directory: &str,
        kind: Option<&ResourceKind>,
    ) -> Vec<ResourceInfo> {
        self.infos_where(|record| {
            record.locator.is_under(directory)
                && kind.is_none_or(|kind| {
                    let resolved = record
                        .kind
                        .clone()
                        .or_else(|| self.factories.infer_kind(&record.locator));
                    resolved.as_ref() == Some(kind)
                })
        })
    }

    fn infos_where(&self, keep: impl Fn(&ResourceRecord) -> bool) -> Vec<ResourceInfo> {
        self.ids
            .iter()
            .filter_map(|(id, &key)| {
                let record = self.records.get(key)?;
                keep(record).then(|| ResourceInfo {
                    key,
                    id: id.clone(),
                    locator: record.locator.clone(),
                })
            })
            .collect()
    }

    /// The kind a file would be loaded as, from its extension alone.
    pub fn resource_type(&self, locator: &FileLocator) -> Option<ResourceKind> {
        self.factories.infer_kind(locator)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // -- Access --

    /// Load `id` if needed and return its payload.
    pub fn get(&mut self, id: &str) -> Option<&dyn Resource> {
        let key = self.load(id, None).ok()?;
        self.resource(key)
    }

    /// [`get`](Self::get) narrowed to a concrete resource type.
    pub fn get_as<T: Resource>(&mut self, id: &str) -> Option<&T> {
        self.get(id)?.downcast_ref::<T>()
    }

    /// Load every registered record. Returns how many loaded successfully,
    /// including those that were already loaded.
    pub fn preload_all(&mut self) -> usize {
        let keys: Vec<ResourceKey> = self.ids.values().copied().collect();
        keys.into_iter()
            .filter(|&key| self.load_key(key, None).is_ok())
            .count()
    }

    /// Save every loaded payload that supports saving. Returns how many were
    /// written.
    pub fn save_all(&self) -> usize {
        let mut saved = 0;
        for record in self.records.values() {
            let Some(payload) = record.payload.as_ref() else {
                continue;
            };
            match payload.save_to_file(&record.locator) {
                Ok(()) => saved += 1,
                Err(ResourceError::Unsupported { .. }) => {}
                Err(e) => warn!("{e}"),
            }
        }
        saved
    }

    // -- Lifecycle --

    /// Register a resource built in code. It counts as loaded immediately.
    pub fn add_resource(
        &mut self,
        mut resource: Box<dyn Resource>,
        locator: FileLocator,
    ) -> Result<ResourceKey, ResourceError> {
        let Some(id) = self.resource_id_for(&locator) else {
            error!("cannot add a resource at {locator}: no usable name");
            return Err(ResourceError::InvalidName(locator.to_string()));
        };
        let key = self.register(&id, locator.clone())?;
        resource.init(&ResourceInfo { key, id, locator });
        if let Some(record) = self.records.get_mut(key) {
            record.kind = Some(resource.kind());
            record.payload = Some(resource);
        }
        self.track(key);
        Ok(key)
    }

    /// Relocate `id` to `new_locator`.
    ///
    /// The payload is saved at the new path first. Only after a successful
    /// save is the record re-keyed and the old file deleted, so a failed
    /// save leaves the registry untouched.
    pub fn move_resource(
        &mut self,
        id: &str,
        new_locator: FileLocator,
    ) -> Result<ResourceKey, ResourceError> {
        let Some(key) = self.key_of(id) else {
            return Err(ResourceError::UnknownId(id.to_string()));
        };
        let Some(new_id) = self.resource_id_for(&new_locator) else {
            return Err(ResourceError::InvalidName(new_locator.to_string()));
        };
        if new_id != id && self.ids.contains_key(&new_id) {
            error!("cannot move '{id}' to {new_locator}: '{new_id}' already exists");
            return Err(ResourceError::MoveTargetCollision { id: new_id });
        }

        self.load_key(key, None)?;
        let Some(record) = self.records.get_mut(key) else {
            return Err(ResourceError::UnknownId(id.to_string()));
        };
        let Some(payload) = record.payload.as_mut() else {
            return Err(ResourceError::UnknownId(id.to_string()));
        };
        payload.save_to_file(&new_locator)?;
        payload.init(&ResourceInfo {
            key,
            id: new_id.clone(),
            locator: new_locator.clone(),
        });

        let old_locator = std::mem::replace(&mut record.locator, new_locator);
        record.id = new_id.clone();
        self.ids.remove(id);
        self.ids.insert(new_id.clone(), key);

        if old_locator != record.locator && old_locator.exists() {
            if let Err(e) = old_locator.remove_file() {
                warn!("moved '{id}' to '{new_id}' but could not delete {old_locator}: {e}");
            }
        }
        debug!("moved '{id}' to '{new_id}'");

        self.graph.notify_updated(key, &mut self.records);
        Ok(key)
    }

    /// Detach `id` from the registry.
    ///
    /// Referencers and listeners are notified first (including referencers
    /// still waiting on an untracked `id`), then graph edges are severed,
    /// and only then does the record leave the arena. With
    /// `unload == false` the payload is handed back to the caller instead of
    /// being dropped.
    pub fn remove_resource(
        &mut self,
        id: &str,
        unload: bool,
    ) -> Result<Option<Box<dyn Resource>>, ResourceError> {
        let Some(key) = self.key_of(id) else {
            warn!("cannot remove unknown resource '{id}'");
            return Err(ResourceError::UnknownId(id.to_string()));
        };

        self.graph.notify_removed(key, &mut self.records);
        if self.graph.is_tracked(key) {
            if let Err(e) = self.graph.unregister_tracking(key) {
                warn!("{e}");
            }
        }
        self.graph.forget(key);

        self.ids.remove(id);
        let payload = self.records.remove(key).and_then(|record| record.payload);
        debug!("removed '{id}'");
        Ok(if unload { None } else { payload })
    }

    /// Remove `id` and delete its backing file.
    pub fn delete_resource(&mut self, id: &str) -> Result<(), ResourceError> {
        let Some(locator) = self.file_locator(id).cloned() else {
            return Err(ResourceError::UnknownId(id.to_string()));
        };
        self.remove_resource(id, true)?;
        locator.remove_file()?;
        debug!("deleted {locator}");
        Ok(())
    }

    /// Remove every record whose file lives under `directory`. Returns how
    /// many were removed.
    pub fn remove_resources_from_path(&mut self, directory: &str) -> usize {
        let ids: Vec<String> = self
            .records
            .values()
            .filter(|record| record.locator.is_under(directory))
            .map(|record| record.id.clone())
            .collect();
        ids.iter()
            .filter(|id| self.remove_resource(id, true).is_ok())
            .count()
    }

    // -- Dependencies and listeners --

    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The keys `id` currently depends on, if it is tracked.
    pub fn resource_dependencies(&self, id: &str) -> Option<&BTreeSet<ResourceKey>> {
        self.graph.dependencies(self.key_of(id)?)
    }

    pub fn register_listener(
        &mut self,
        id: &str,
        handle: ListenerHandle,
        callback: ResourceListener,
    ) -> Result<(), ResourceError> {
        let Some(key) = self.key_of(id) else {
            return Err(ResourceError::UnknownId(id.to_string()));
        };
        self.graph
            .register_listener(key, handle, callback)
            .map_err(|e| self.graph_error(id, e))
    }

    pub fn unregister_listener(&mut self, id: &str, handle: ListenerHandle) -> usize {
        match self.key_of(id) {
            Some(key) => self.graph.unregister_listener(key, handle),
            None => 0,
        }
    }

    pub fn unregister_all_listeners(&mut self, handle: ListenerHandle) -> usize {
        self.graph.unregister_all_listeners(handle)
    }

    /// Tell referencers and listeners that `id` changed.
    pub fn notify_updated(&mut self, id: &str) -> Result<(), ResourceError> {
        let Some(key) = self.key_of(id) else {
            return Err(ResourceError::UnknownId(id.to_string()));
        };
        self.graph.notify_updated(key, &mut self.records);
        Ok(())
    }

    /// Re-capture the declared dependencies of `id`. Returns the resources
    /// whose dependency set changed.
    pub fn update_dependencies(&mut self, id: &str) -> Result<Vec<ResourceKey>, ResourceError> {
        let Some(key) = self.key_of(id) else {
            return Err(ResourceError::UnknownId(id.to_string()));
        };
        if !self.graph.is_tracked(key) {
            return Ok(Vec::new());
        }
        Ok(self.graph.capture_dependencies(key, &self.records))
    }

    /// The save path of an editor: notify, then re-capture dependencies.
    pub fn update_resource(&mut self, id: &str) -> Result<(), ResourceError> {
        self.notify_updated(id)?;
        self.update_dependencies(id)?;
        Ok(())
    }

    fn graph_error(&self, id: &str, error: DependencyError) -> ResourceError {
        match error {
            DependencyError::Untracked(_) => {
                error!("cannot register a listener on '{id}': it is not loaded or not tracked");
                ResourceError::ListenerOnUntrackedResource(id.to_string())
            }
            DependencyError::AlreadyTracked(_) => ResourceError::AlreadyTracked(id.to_string()),
        }
    }
}

fn collect_files(directory: &Path, files: &mut Vec<std::path::PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
